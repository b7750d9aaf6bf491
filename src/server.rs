//! HTTP server lifecycle
//!
//! Builds stores, the notification dispatcher, scheduled jobs and the router,
//! then serves until Ctrl+C or SIGTERM and drains background work.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::routes::create_router;
use crate::config::StorageBackend;
use crate::config::settings::Settings;
use crate::db::establish_async_connection_pool;
use crate::jobs::{JobContext, JobScheduler, TokenPurgeTask};
use crate::repositories::Repositories;
use crate::services::Services;
use crate::services::notifications::{NotificationDispatcher, build_sender};
use crate::state::AppState;

pub struct Server {
    settings: Settings,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Start the server and run until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// - the connection pool or SMTP transport cannot be built
    /// - the bind address is unavailable
    /// - a scheduled job has an invalid cron expression
    pub async fn run(self) -> anyhow::Result<()> {
        let settings = self.settings;

        tracing::info!(
            app_name = %settings.application.name,
            app_version = %settings.application.version,
            environment = %settings.application.environment,
            "Application starting"
        );
        tracing::info!(
            host = %settings.server.host,
            port = settings.server.port,
            request_timeout = settings.server.request_timeout,
            "Server configuration loaded"
        );
        tracing::info!(
            activation_ttl_hours = settings.auth.activation_token_ttl_hours,
            authentication_ttl_hours = settings.auth.authentication_token_ttl_hours,
            expose_activation_token = settings.auth.expose_activation_token,
            "Auth configuration loaded"
        );

        let repos = build_repositories(&settings).await?;

        let shutdown = CancellationToken::new();
        let sender = build_sender(&settings.notifications)?;
        let (dispatcher, workers) = NotificationDispatcher::start(
            sender,
            settings.notifications.workers,
            settings.notifications.queue_capacity,
            shutdown.clone(),
        );

        let state = AppState::new(repos, settings.clone(), dispatcher)?;
        let scheduler = start_jobs(&settings, state.services.clone(), shutdown.clone()).await?;

        let router = create_router(state);

        let address = settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;
        tracing::info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        drain(shutdown, scheduler, workers).await;
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

async fn build_repositories(settings: &Settings) -> anyhow::Result<Repositories> {
    match settings.database.backend {
        StorageBackend::Postgres => {
            tracing::info!(
                max_connections = settings.database.max_connections,
                min_connections = settings.database.min_connections,
                statement_timeout_ms = settings.database.statement_timeout_ms,
                "Initializing database connection pool"
            );
            let pool = establish_async_connection_pool(&settings.database).await?;
            tracing::info!("Database connection pool initialized");
            Ok(Repositories::postgres(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, all data is lost on restart");
            Ok(Repositories::in_memory())
        }
    }
}

async fn start_jobs(
    settings: &Settings,
    services: Services,
    shutdown: CancellationToken,
) -> anyhow::Result<Option<JobScheduler>> {
    if !settings.jobs.token_purge_enabled {
        tracing::info!("Token purge job disabled");
        return Ok(None);
    }

    let scheduler = JobScheduler::new(JobContext {
        services,
        cancellation_token: shutdown,
    })
    .await?;
    scheduler
        .schedule(&settings.jobs.token_purge_schedule, Arc::new(TokenPurgeTask))
        .await?;
    scheduler.start().await?;

    Ok(Some(scheduler))
}

/// Stop jobs and let notification workers finish their current delivery
async fn drain(
    shutdown: CancellationToken,
    scheduler: Option<JobScheduler>,
    workers: Vec<JoinHandle<()>>,
) {
    shutdown.cancel();

    if let Some(scheduler) = scheduler
        && let Err(e) = scheduler.stop().await
    {
        tracing::warn!(error = %e, "Failed to stop job scheduler");
    }

    for worker in workers {
        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "Notification worker ended abnormally");
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
