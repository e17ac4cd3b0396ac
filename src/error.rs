//! Error types for the library server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Error taxonomy exposed to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Conflict,
    TooManyRequests,
    Timeout,
    Unavailable,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::InvalidArgument | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Timeout => StatusCode::REQUEST_TIMEOUT,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid request: {0}")]
    InvalidFields(#[from] ValidationErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Validation(_) | AppError::InvalidFields(_) => ErrorKind::InvalidArgument,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::RateLimited(_) => ErrorKind::TooManyRequests,
            AppError::Timeout(_) => ErrorKind::Timeout,
            AppError::Unavailable(_) => ErrorKind::Unavailable,
            AppError::Database(e) => classify_database_error(e),
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Translate a unique-constraint violation into a `Conflict` carrying `message`.
    pub fn unique_violation_as(error: sqlx::Error, message: &str) -> Self {
        if is_unique_violation(&error) {
            AppError::Conflict(message.to_string())
        } else {
            AppError::Database(error)
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::RateLimited(msg)
            | AppError::Timeout(msg)
            | AppError::Unavailable(msg) => msg.clone(),
            AppError::InvalidFields(errors) => field_errors(errors)
                .into_iter()
                .next()
                .map(|e| e.message)
                .unwrap_or_else(|| "Validation error".to_string()),
            AppError::Database(e) => match classify_database_error(e) {
                ErrorKind::Unavailable => "Service temporarily unavailable".to_string(),
                ErrorKind::Conflict => "Resource already exists".to_string(),
                _ => "Internal server error".to_string(),
            },
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn classify_database_error(error: &sqlx::Error) -> ErrorKind {
    match error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            ErrorKind::Unavailable
        }
        e if is_unique_violation(e) => ErrorKind::Conflict,
        _ => ErrorKind::Internal,
    }
}

/// A single field-level validation failure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field)),
            })
        })
        .collect()
}

/// Error response body
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    /// Diagnostic detail, only present outside production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Diagnostic information attached to error responses.
///
/// The `error_detail` middleware folds it into the body outside production.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub body: ErrorResponse,
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        match kind {
            ErrorKind::Internal => tracing::error!("Internal error: {:?}", self),
            ErrorKind::Unavailable => tracing::warn!("Store unavailable: {:?}", self),
            _ => tracing::debug!("Request failed: {}", self),
        }

        let body = ErrorResponse {
            error: kind,
            message: self.client_message(),
            errors: match &self {
                AppError::InvalidFields(errors) => field_errors(errors),
                _ => Vec::new(),
            },
            detail: None,
        };

        let mut response = (kind.status(), Json(body.clone())).into_response();
        response.extensions_mut().insert(ErrorDetail {
            body,
            detail: format!("{:?}", self),
        });
        response
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
