//! API handlers for the library REST endpoints

pub mod books;
pub mod extract;
pub mod health;
pub mod loans;
pub mod middleware;
pub mod openapi;
pub mod users;

#[cfg(test)]
pub(crate) mod testutils;

use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{error::AppError, AppState};

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/:id", get(books::get_book))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/:id", get(users::get_user))
        // Loans
        .route("/users/:user_id/borrow/:book_id", post(loans::borrow_book))
        .route("/users/:user_id/return/:book_id", post(loans::return_book))
        .with_state(state.clone());

    let router = Router::new()
        .merge(routes)
        .merge(openapi::create_openapi_router())
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(middleware::handle_panic))
        .layer(axum::middleware::from_fn_with_state(state, middleware::error_detail))
        .layer(DefaultBodyLimit::max(config.server.body_limit_bytes));

    let router = middleware::request_timeout(router, config.server.request_timeout());
    let router = middleware::security_headers(router.layer(middleware::cors_layer(&config)));
    let router = middleware::rate_limit(router, &config.rate_limit);
    router.layer(TraceLayer::new_for_http())
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Can't find {} on this server!", uri.path()))
}
