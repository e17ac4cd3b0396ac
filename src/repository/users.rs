//! Users repository for database operations

use async_trait::async_trait;

use crate::{
    error::{AppError, AppResult},
    models::User,
};

use super::PgStore;

pub(crate) const USER_EXISTS: &str = "User already exists";

/// User records. Users are never updated nor deleted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Insert a user, failing with `Conflict` when the name is taken
    async fn create(&self, name: &str) -> AppResult<User>;

    /// All users ordered by name
    async fn list(&self) -> AppResult<Vec<User>>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;
}

#[async_trait]
impl UsersRepository for PgStore {
    async fn create(&self, name: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>("INSERT INTO users (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::unique_violation_as(e, USER_EXISTS))
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(r#"SELECT id, name FROM users ORDER BY name COLLATE "C", id"#)
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
