//! User management service

use crate::{
    error::AppResult,
    models::{user::CreateUser, LoanHistory, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all users ordered by name
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    /// Get a user and their borrowing history
    pub async fn get_user(&self, id: i64) -> AppResult<(User, LoanHistory)> {
        let user = self.repository.get_user(id).await?;
        let borrows = self.repository.loans.find_borrows_for_user(id).await?;
        Ok((user, LoanHistory::new(borrows)))
    }

    /// Create a new user
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        tracing::debug!(name = %user.name, "Creating user");
        let created = self.repository.users.create(&user.name).await?;
        tracing::info!(user_id = created.id, name = %created.name, "User created");
        Ok(created)
    }
}
