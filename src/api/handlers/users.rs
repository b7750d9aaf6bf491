//! Account registration, activation and the current user.

use axum::{Json, extract::State, http::StatusCode};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::USER_TAG;
use crate::api::dto::{
    ActivateUserRequest, ErrorResponse, RegisterUserRequest, RegisterUserResponse, UserResponse,
};
use crate::api::middleware::AuthenticatedUser;
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::ValidatedJson;

/// Creates user-related routes.
///
/// Routes:
/// - POST /users            - Register a new account
/// - PUT  /users/activated  - Redeem an activation token
/// - GET  /users/me         - Current user
pub fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(register_user))
        .routes(routes!(activate_user))
        .routes(routes!(get_me))
}

/// POST /v1/users - Register
///
/// Creates an unactivated account and mails it an activation token.
#[utoipa::path(
    post,
    path = "/users",
    tag = USER_TAG,
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterUserResponse),
        (status = 409, description = "Name or email already in use", body = ErrorResponse),
        (status = 422, description = "Invalid request body", body = ErrorResponse)
    )
)]
async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterUserRequest>,
) -> AppResult<(StatusCode, Json<RegisterUserResponse>)> {
    let registration = state
        .services
        .auth
        .register(&payload.name, &payload.email, &payload.password)
        .await?;

    let activation_token = state
        .settings
        .auth
        .expose_activation_token
        .then_some(registration.activation_token.plaintext);

    Ok((
        StatusCode::CREATED,
        Json(RegisterUserResponse {
            user: registration.user.into(),
            activation_token,
        }),
    ))
}

/// PUT /v1/users/activated - Activate
#[utoipa::path(
    put,
    path = "/users/activated",
    tag = USER_TAG,
    request_body = ActivateUserRequest,
    responses(
        (status = 200, description = "Account activated", body = UserResponse),
        (status = 409, description = "Concurrent edit", body = ErrorResponse),
        (status = 422, description = "Invalid or expired activation token", body = ErrorResponse)
    )
)]
async fn activate_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ActivateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.auth.activate(&payload.token).await?;
    Ok(Json(user.into()))
}

/// GET /v1/users/me - Current user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = USER_TAG,
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<UserResponse> {
    Json(user.into())
}
