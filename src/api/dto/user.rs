//! User-related DTOs for API requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::User;

/// Request body for registering a new account.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    #[schema(example = "alice", min_length = 1, max_length = 50)]
    pub name: String,
    #[validate(
        email(message = "must be a valid email address"),
        length(max = 255, message = "must be at most 255 characters")
    )]
    #[schema(example = "alice@example.com", format = "email", max_length = 255)]
    pub email: String,
    #[validate(length(min = 8, max = 72, message = "must be between 8 and 72 characters"))]
    #[schema(example = "pa55word", format = "password", min_length = 8, max_length = 72)]
    pub password: String,
}

/// Request body for redeeming an activation token.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ActivateUserRequest {
    #[validate(length(min = 1, message = "must be provided"))]
    #[schema(example = "Vf1ZJ3u8b6mN2xQ0kLw9rT4yHs7dCe5aPoGiUjKl_Mn")]
    pub token: String,
}

/// Account as exposed over HTTP. Never carries the credential or version.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "alice")]
    pub name: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub activated: bool,
    #[schema(value_type = String, format = DateTime, example = "2026-01-01T12:00:00Z")]
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            activated: user.activated,
            created_at: user.created_at.to_jiff().to_string(),
        }
    }
}

/// Response to a successful registration.
///
/// `activation_token` is only present when the server is configured to echo
/// it, which is meant for development and tests.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterUserResponse {
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation_token: Option<String>,
}
