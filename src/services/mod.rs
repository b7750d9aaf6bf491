//! Service layer for business logic operations.
//!
//! Services encapsulate business logic and coordinate between
//! repositories and handlers. Every store call made here is bounded by the
//! configured statement deadline.

mod auth_service;
pub mod notifications;
mod token_service;

pub use auth_service::{AuthPolicy, AuthService, Registration};
pub use token_service::{IssuedToken, TokenService};

use crate::config::Settings;
use crate::error::AppResult;
use crate::repositories::Repositories;
use crate::services::notifications::NotificationDispatcher;
use crate::utils::PasswordHasher;

/// Aggregates all services for convenient access.
///
/// Cloning is cheap since the stores and the dispatcher are shared handles.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub tokens: TokenService,
}

impl Services {
    /// Wire services over `repos`.
    ///
    /// # Errors
    ///
    /// Fails if the configured Argon2 parameters are rejected.
    pub fn new(
        repos: &Repositories,
        settings: &Settings,
        notifier: NotificationDispatcher,
    ) -> AppResult<Self> {
        let deadline = settings.database.statement_timeout();
        let hasher = PasswordHasher::from_config(&settings.auth)?;
        let tokens = TokenService::new(repos, deadline);
        let auth = AuthService::new(
            repos,
            tokens.clone(),
            hasher,
            notifier,
            AuthPolicy::from_settings(settings),
            deadline,
        );

        Ok(Self { auth, tokens })
    }
}
