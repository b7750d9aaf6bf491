//! Application state for Axum web framework.
//!
//! `AppState` is the dependency-injected context built once at startup and
//! handed to every handler and middleware.

use std::sync::Arc;

use crate::config::Settings;
use crate::error::AppResult;
use crate::repositories::Repositories;
use crate::services::Services;
use crate::services::notifications::NotificationDispatcher;

/// Shared services and resources.
///
/// Cloning is cheap since every member is a shared handle.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Direct store access for the health check
    pub repos: Repositories,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire services over the given stores and notification dispatcher.
    ///
    /// # Example
    /// ```ignore
    /// let repos = Repositories::postgres(pool);
    /// let state = AppState::new(repos, settings, dispatcher)?;
    /// ```
    pub fn new(
        repos: Repositories,
        settings: Settings,
        notifier: NotificationDispatcher,
    ) -> AppResult<Self> {
        let services = Services::new(&repos, &settings, notifier)?;
        Ok(Self {
            services,
            repos,
            settings: Arc::new(settings),
        })
    }
}
