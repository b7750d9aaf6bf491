//! Health check endpoint.

use std::time::Instant;

use axum::{Json, extract::State, http::StatusCode};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{ComponentHealth, HealthResponse, HealthStatus};
use crate::db::with_deadline;
use crate::state::AppState;

pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(healthz))
}

/// GET /v1/healthz - Service status
///
/// Reports the running environment and version and pings the user store.
#[utoipa::path(
    get,
    path = "/healthz",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is available", body = HealthResponse),
        (status = 503, description = "The store did not answer", body = HealthResponse)
    )
)]
async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = check_store(&state).await;
    let status = store.status;

    let response = HealthResponse {
        status,
        environment: state.settings.application.environment.to_string(),
        version: state.settings.application.version.clone(),
        store,
    };

    let code = match status {
        HealthStatus::Available => StatusCode::OK,
        HealthStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(response))
}

async fn check_store(state: &AppState) -> ComponentHealth {
    let start = Instant::now();
    let ping = with_deadline(
        state.settings.database.statement_timeout(),
        "ping store",
        state.repos.users.ping(),
    )
    .await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    match ping {
        Ok(()) => ComponentHealth {
            status: HealthStatus::Available,
            message: None,
            response_time_ms,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            ComponentHealth {
                status: HealthStatus::Unavailable,
                message: Some(e.to_string()),
                response_time_ms,
            }
        }
    }
}
