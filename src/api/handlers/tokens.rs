//! Authentication token issuance.

use axum::{Json, extract::State, http::StatusCode};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::AUTH_TAG;
use crate::api::dto::{AuthTokenResponse, CreateAuthTokenRequest, ErrorResponse};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::ValidatedJson;

pub fn token_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(create_authentication_token))
}

/// POST /v1/tokens/authentication - Log in
///
/// Exchanges a name and password for an authentication-scoped bearer token.
/// Login does not require an activated account.
#[utoipa::path(
    post,
    path = "/tokens/authentication",
    tag = AUTH_TAG,
    request_body = CreateAuthTokenRequest,
    responses(
        (status = 201, description = "Token issued", body = AuthTokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Invalid request body", body = ErrorResponse)
    )
)]
async fn create_authentication_token(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateAuthTokenRequest>,
) -> AppResult<(StatusCode, Json<AuthTokenResponse>)> {
    let issued = state
        .services
        .auth
        .login(&payload.name, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(AuthTokenResponse::from(issued))))
}
