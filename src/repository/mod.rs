//! Repository layer for database operations

pub mod books;
pub mod loans;
pub mod users;

#[cfg(test)]
pub(crate) mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{Book, User},
};

pub use books::BooksRepository;
pub use loans::LoansRepository;
pub use users::UsersRepository;

/// Store connectivity
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HealthRepository: Send + Sync {
    async fn ping(&self) -> AppResult<()>;
}

/// PostgreSQL-backed store implementing every repository trait
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthRepository for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Main repository struct holding the store behind each concern
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn UsersRepository>,
    pub books: Arc<dyn BooksRepository>,
    pub loans: Arc<dyn LoansRepository>,
    pub health: Arc<dyn HealthRepository>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)))
    }

    /// Use a single store for every concern
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UsersRepository + BooksRepository + LoansRepository + HealthRepository + 'static,
    {
        Self {
            users: store.clone(),
            books: store.clone(),
            loans: store.clone(),
            health: store,
        }
    }

    /// Get user by ID
    pub async fn get_user(&self, id: i64) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.books
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }
}
