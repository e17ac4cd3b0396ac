//! In-memory SQLite store used by tests.
//!
//! Mirrors the PostgreSQL schema, including the partial unique index that
//! keeps a single active loan per book.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{BorrowRow, BorrowedBookRow},
        Book, Borrow, BorrowedBook, Score, ScoreTotals, User,
    },
};

use super::{
    books::BOOK_EXISTS,
    loans::{BORROW_CONFLICT, CLOSE_LOAN, INSERT_LOAN, SELECT_ACTIVE_LOAN, SELECT_SCORE_TOTALS, SELECT_USER_BORROWS},
    users::USER_EXISTS,
    BooksRepository, HealthRepository, LoansRepository, Repository, UsersRepository,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE CHECK (name <> '')
    )
    "#,
    r#"
    CREATE TABLE books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE CHECK (name <> '')
    )
    "#,
    r#"
    CREATE TABLE borrows (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users (id),
        book_id INTEGER NOT NULL REFERENCES books (id),
        borrowed_at TEXT NOT NULL,
        returned_at TEXT,
        user_score INTEGER CHECK (user_score BETWEEN 0 AND 10),
        CHECK ((returned_at IS NULL) = (user_score IS NULL))
    )
    "#,
    "CREATE UNIQUE INDEX borrows_one_active_per_book ON borrows (book_id) WHERE returned_at IS NULL",
];

#[derive(Clone)]
pub(crate) struct SqliteStore {
    pub(crate) pool: SqlitePool,
}

impl SqliteStore {
    /// A fresh database living in a single pooled connection
    pub(crate) async fn connect() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await.unwrap();
        }
        Self { pool }
    }
}

/// A repository backed by a fresh in-memory database
pub(crate) async fn repository() -> Repository {
    Repository::from_store(Arc::new(SqliteStore::connect().await))
}

#[async_trait]
impl UsersRepository for SqliteStore {
    async fn create(&self, name: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>("INSERT INTO users (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::unique_violation_as(e, USER_EXISTS))
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT id, name FROM users ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl BooksRepository for SqliteStore {
    async fn create(&self, name: &str) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("INSERT INTO books (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::unique_violation_as(e, BOOK_EXISTS))
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT id, name FROM books ORDER BY name, id")
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

#[async_trait]
impl LoansRepository for SqliteStore {
    async fn find_active_loan_for_book(&self, book_id: i64) -> AppResult<Option<Borrow>> {
        sqlx::query_as::<_, BorrowRow>(SELECT_ACTIVE_LOAN)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Borrow::try_from)
            .transpose()
    }

    async fn find_borrows_for_user(&self, user_id: i64) -> AppResult<Vec<BorrowedBook>> {
        sqlx::query_as::<_, BorrowedBookRow>(SELECT_USER_BORROWS)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(BorrowedBook::try_from)
            .collect()
    }

    async fn create(&self, user_id: i64, book_id: i64, borrowed_at: DateTime<Utc>) -> AppResult<Borrow> {
        let row = sqlx::query_as::<_, BorrowRow>(INSERT_LOAN)
            .bind(user_id)
            .bind(book_id)
            .bind(borrowed_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::unique_violation_as(e, BORROW_CONFLICT))?;
        Borrow::try_from(row)
    }

    async fn close(&self, user_id: i64, book_id: i64, score: Score, returned_at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(CLOSE_LOAN)
            .bind(returned_at)
            .bind(i32::from(score.value()))
            .bind(user_id)
            .bind(book_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn score_totals(&self, book_id: i64) -> AppResult<ScoreTotals> {
        let totals = sqlx::query_as::<_, ScoreTotals>(SELECT_SCORE_TOTALS)
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(totals)
    }
}

#[async_trait]
impl HealthRepository for SqliteStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::tests;

    macro_rules! sqlite_test {
        ( $name:ident ) => {
            #[tokio::test]
            async fn $name() {
                tests::$name(repository().await).await;
            }
        };
    }

    sqlite_test!(test_users_create_and_list);
    sqlite_test!(test_users_duplicate_name);
    sqlite_test!(test_books_create_and_list);
    sqlite_test!(test_books_duplicate_name);
    sqlite_test!(test_find_missing);
    sqlite_test!(test_loan_lifecycle);
    sqlite_test!(test_second_active_loan_rejected);
    sqlite_test!(test_close_requires_matching_user);
    sqlite_test!(test_close_twice);
    sqlite_test!(test_score_totals);
    sqlite_test!(test_borrows_for_user);

    #[tokio::test]
    async fn test_schema_rejects_score_without_return() {
        let store = SqliteStore::connect().await;
        let user = UsersRepository::create(&store, "Alice").await.unwrap();
        let book = BooksRepository::create(&store, "Dune").await.unwrap();

        let result = sqlx::query("INSERT INTO borrows (user_id, book_id, borrowed_at, user_score) VALUES ($1, $2, $3, 5)")
            .bind(user.id)
            .bind(book.id)
            .bind(Utc::now())
            .execute(&store.pool)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_ping() {
        repository().await.health.ping().await.unwrap();
    }
}
