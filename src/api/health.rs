//! Health check endpoints

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    AppState,
};

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "success" when the process answers
    pub status: String,
    pub message: String,
    /// Run mode (development or production)
    pub environment: String,
    /// Version of the service
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    fn new(state: &AppState, message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            environment: state.config.environment.as_str().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(&state, "API is running"))
}

/// Readiness check endpoint (checks database connectivity)
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse),
        (status = 503, description = "Database is not reachable", body = crate::error::ErrorResponse)
    )
)]
pub async fn readiness_check(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    if let Err(e) = state.services.check_store().await {
        tracing::warn!(error = %e, "Readiness check failed");
        return Err(AppError::Unavailable("Database is not reachable".to_string()));
    }

    Ok(Json(HealthResponse::new(&state, "API is ready")))
}
