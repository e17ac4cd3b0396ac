//! Books repository for database operations

use async_trait::async_trait;

use crate::{
    error::{AppError, AppResult},
    models::Book,
};

use super::PgStore;

pub(crate) const BOOK_EXISTS: &str = "Book already exists";

/// Book records. Books are never updated nor deleted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// Insert a book, failing with `Conflict` when the name is taken
    async fn create(&self, name: &str) -> AppResult<Book>;

    /// All books ordered by name
    async fn list(&self) -> AppResult<Vec<Book>>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>>;
}

#[async_trait]
impl BooksRepository for PgStore {
    async fn create(&self, name: &str) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("INSERT INTO books (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::unique_violation_as(e, BOOK_EXISTS))
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        // Byte-wise ordering, independent of the database locale
        let books = sqlx::query_as::<_, Book>(r#"SELECT id, name FROM books ORDER BY name COLLATE "C", id"#)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT id, name FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }
}
