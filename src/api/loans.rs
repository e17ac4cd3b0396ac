//! Borrow and return endpoints

use axum::{extract::State, http::StatusCode};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::loan::ReturnBook,
    AppState,
};

use super::extract::{JsonBody, PathParams};

/// Borrow a book
#[utoipa::path(
    post,
    path = "/users/{user_id}/borrow/{book_id}",
    tag = "loans",
    params(
        ("user_id" = i64, Path, description = "User ID"),
        ("book_id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book borrowed"),
        (status = 400, description = "Invalid IDs or book already borrowed", body = crate::error::ErrorResponse),
        (status = 404, description = "User or book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    PathParams((user_id, book_id)): PathParams<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.services.loans.borrow_book(user_id, book_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Return a borrowed book with a score
#[utoipa::path(
    post,
    path = "/users/{user_id}/return/{book_id}",
    tag = "loans",
    params(
        ("user_id" = i64, Path, description = "User ID"),
        ("book_id" = i64, Path, description = "Book ID")
    ),
    request_body = ReturnBook,
    responses(
        (status = 204, description = "Book returned"),
        (status = 400, description = "Invalid score or book not borrowed by this user", body = crate::error::ErrorResponse),
        (status = 404, description = "User or book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    PathParams((user_id, book_id)): PathParams<(i64, i64)>,
    JsonBody(request): JsonBody<ReturnBook>,
) -> AppResult<StatusCode> {
    request.validate()?;
    let score = request
        .score
        .ok_or_else(|| AppError::Validation("Score is required".to_string()))?;

    state.services.loans.return_book(user_id, book_id, score).await?;
    Ok(StatusCode::NO_CONTENT)
}
