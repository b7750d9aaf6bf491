//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `user` - registration, activation and account responses
//! - `auth` - authentication token requests and responses
//! - `health` - health check response
//! - `error` - common error response

mod auth;
mod error;
mod health;
mod user;

pub use auth::{AuthTokenResponse, CreateAuthTokenRequest};
pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use user::{ActivateUserRequest, RegisterUserRequest, RegisterUserResponse, UserResponse};
