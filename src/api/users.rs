//! User management endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{user::CreateUser, LoanHistory, User},
    AppState,
};

use super::extract::{JsonBody, PathParams};

/// A returned book with the score the user gave it
#[derive(Debug, Serialize, ToSchema)]
pub struct PastBook {
    pub name: String,
    #[serde(rename = "userScore")]
    pub user_score: u8,
}

/// A book the user currently holds
#[derive(Debug, Serialize, ToSchema)]
pub struct PresentBook {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserBooks {
    pub past: Vec<PastBook>,
    pub present: Vec<PresentBook>,
}

/// User with their borrowing history
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetails {
    pub id: i64,
    pub name: String,
    pub books: UserBooks,
}

impl UserDetails {
    pub fn new(user: User, history: &LoanHistory) -> Self {
        Self {
            id: user.id,
            name: user.name,
            books: UserBooks {
                past: history
                    .past()
                    .map(|loan| PastBook {
                        name: loan.name.to_string(),
                        user_score: loan.score.value(),
                    })
                    .collect(),
                present: history
                    .present()
                    .map(|loan| PresentBook {
                        name: loan.name.to_string(),
                    })
                    .collect(),
            },
        }
    }
}

/// List all users ordered by name
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses(
        (status = 200, description = "List of users", body = Vec<User>)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state.services.users.list_users().await?;
    Ok(Json(users))
}

/// Get a user and their borrowing history
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserDetails),
        (status = 400, description = "Invalid user ID", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    PathParams(id): PathParams<i64>,
) -> AppResult<Json<UserDetails>> {
    let (user, history) = state.services.users.get_user(id).await?;
    Ok(Json(UserDetails::new(user, &history)))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid name or user already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(user): JsonBody<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    user.validate()?;

    let created = state.services.users.create_user(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
