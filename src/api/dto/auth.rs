//! Authentication-related Data Transfer Objects

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::TokenScope;
use crate::services::IssuedToken;

/// Login request payload
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateAuthTokenRequest {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    #[schema(example = "alice")]
    pub name: String,
    #[validate(length(min = 1, max = 72, message = "must be provided"))]
    #[schema(example = "pa55word", format = "password")]
    pub password: String,
}

/// A freshly issued token; the plaintext is shown only in this response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthTokenResponse {
    #[schema(example = "Vf1ZJ3u8b6mN2xQ0kLw9rT4yHs7dCe5aPoGiUjKl_Mn")]
    pub token: String,
    pub scope: TokenScope,
    #[schema(value_type = String, format = DateTime, example = "2026-01-02T12:00:00Z")]
    pub expiry: String,
}

impl From<IssuedToken> for AuthTokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.plaintext,
            scope: issued.scope,
            expiry: issued.expiry.to_string(),
        }
    }
}
