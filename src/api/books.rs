//! Book catalog endpoints

use axum::{extract::State, http::StatusCode, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{book::CreateBook, AverageScore, Book, BookDetails},
    AppState,
};

use super::extract::{JsonBody, PathParams};

/// Score as rendered to clients
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Mean(Decimal),
    /// `-1` for unscored books when the legacy rendering is enabled
    Legacy(i8),
}

/// Book with its average score
#[derive(Debug, Serialize, ToSchema)]
pub struct BookResponse {
    pub id: i64,
    pub name: String,
    /// Mean score with two decimals, null when the book has never been scored
    #[schema(value_type = Option<String>, example = "8.67")]
    pub score: Option<ScoreValue>,
}

impl BookResponse {
    pub fn new(details: BookDetails, legacy_sentinel: bool) -> Self {
        let score = match details.score {
            AverageScore::Mean(mean) => Some(ScoreValue::Mean(mean)),
            AverageScore::Unscored if legacy_sentinel => Some(ScoreValue::Legacy(-1)),
            AverageScore::Unscored => None,
        };

        Self {
            id: details.book.id,
            name: details.book.name,
            score,
        }
    }
}

/// List all books ordered by name
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "List of books", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list_books().await?;
    Ok(Json(books))
}

/// Get a book and its average score
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookResponse),
        (status = 400, description = "Invalid book ID", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    PathParams(id): PathParams<i64>,
) -> AppResult<Json<BookResponse>> {
    let details = state.services.books.get_book(id).await?;
    Ok(Json(BookResponse::new(details, state.config.api.legacy_score_sentinel)))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid name or book already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    JsonBody(book): JsonBody<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    book.validate()?;

    let created = state.services.books.create_book(book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
