//! Router configuration for the API.
//!
//! This module provides centralized route registration and middleware
//! configuration for the application.

use std::time::Duration;

use axum::{Router, http::StatusCode, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{
    authenticate, global_error_handler, logging_middleware, request_id_middleware,
};
use crate::state::AppState;

/// Routes served under `/v1`
fn v1_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(handlers::health::health_routes())
        .merge(handlers::users::user_routes())
        .merge(handlers::tokens::token_routes())
}

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Last added runs first, so a request passes through:
/// 1. request id
/// 2. access log
/// 3. error envelope (adds the request id to error bodies)
/// 4. authentication (attaches the `Principal`)
/// 5. request timeout
pub fn create_router(state: AppState) -> Router {
    let (api_router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/v1", v1_routes())
        .split_for_parts();

    let request_timeout = Duration::from_secs(state.settings.server.request_timeout);

    api_router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new())
        .with_state(state)
}
