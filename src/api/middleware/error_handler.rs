//! Error handler for converting AppError to HTTP responses.
//!
//! `AppError` renders itself as an `ErrorResponse` body and also stores that
//! body in the response extensions. `global_error_handler` picks it up to
//! attach the request id, and gives plain-text framework errors (unknown
//! route, wrong method, request timeout) the same JSON shape.

use axum::{
    Json,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::dto::ErrorResponse;
use crate::api::middleware::RequestId;
use crate::error::AppError;

const TOKEN_INVALID_MESSAGE: &str = "invalid or expired activation token";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        let code = error_to_code(&self);

        let body = match &self {
            AppError::NotFound { entity, .. } => {
                ErrorResponse::new(code, format!("The requested {} could not be found", entity))
            }
            AppError::Duplicate { field, .. } => {
                ErrorResponse::new(code, format!("A user with this {} already exists", field))
                    .with_details(json!([{ "field": field, "message": "already in use" }]))
            }
            AppError::Validation { field, reason } => ErrorResponse::new(code, "Request validation failed")
                .with_details(json!([{ "field": field, "message": reason }])),
            AppError::ValidationErrors { errors } => {
                ErrorResponse::new(code, "Request validation failed").with_details(json!(errors))
            }
            AppError::TokenInvalid => ErrorResponse::new(code, "Request validation failed")
                .with_details(json!([{ "field": "token", "message": TOKEN_INVALID_MESSAGE }])),
            AppError::BadRequest { message } => ErrorResponse::new(code, message.clone()),
            AppError::Conflict { .. } => ErrorResponse::new(
                code,
                "Unable to update the record due to an edit conflict, please try again",
            ),
            AppError::Timeout { .. } | AppError::ConnectionPool { .. } => {
                ErrorResponse::new(code, "The service is temporarily unavailable")
            }
            // Auth failures carry their own deliberately vague Display text
            AppError::MalformedCredential
            | AppError::InvalidCredentials
            | AppError::Unauthenticated
            | AppError::InactiveAccount => ErrorResponse::new(code, self.to_string()),
            AppError::Database { .. }
            | AppError::PasswordHash { .. }
            | AppError::CorruptCredential { .. }
            | AppError::Notification { .. }
            | AppError::Configuration { .. }
            | AppError::Internal { .. } => {
                ErrorResponse::new(code, "The server encountered a problem and could not process your request")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let mut response = (status, Json(body.clone())).into_response();
        if status == StatusCode::UNAUTHORIZED && !matches!(self, AppError::InvalidCredentials) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response.extensions_mut().insert(body);
        response
    }
}

/// Maps an AppError variant to its corresponding HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::ValidationErrors { .. } | AppError::TokenInvalid => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::MalformedCredential
        | AppError::InvalidCredentials
        | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AppError::InactiveAccount => StatusCode::FORBIDDEN,
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Duplicate { .. } | AppError::Conflict { .. } => StatusCode::CONFLICT,
        AppError::Timeout { .. } | AppError::ConnectionPool { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        AppError::Database { .. }
        | AppError::PasswordHash { .. }
        | AppError::CorruptCredential { .. }
        | AppError::Notification { .. }
        | AppError::Configuration { .. }
        | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps an AppError variant to its error code string.
pub fn error_to_code(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound { .. } => "NOT_FOUND",
        AppError::Duplicate { .. } => "DUPLICATE_ENTRY",
        AppError::Validation { .. } | AppError::ValidationErrors { .. } => "VALIDATION_ERROR",
        AppError::BadRequest { .. } => "BAD_REQUEST",
        AppError::MalformedCredential => "MALFORMED_CREDENTIAL",
        AppError::InvalidCredentials => "INVALID_CREDENTIALS",
        AppError::TokenInvalid => "TOKEN_INVALID",
        AppError::Unauthenticated => "UNAUTHENTICATED",
        AppError::InactiveAccount => "INACTIVE_ACCOUNT",
        AppError::Conflict { .. } => "EDIT_CONFLICT",
        AppError::Timeout { .. } | AppError::ConnectionPool { .. } => "SERVICE_UNAVAILABLE",
        AppError::Database { .. } => "DATABASE_ERROR",
        AppError::Configuration { .. } => "CONFIGURATION_ERROR",
        AppError::PasswordHash { .. }
        | AppError::CorruptCredential { .. }
        | AppError::Notification { .. }
        | AppError::Internal { .. } => "INTERNAL_ERROR",
    }
}

/// Error body for framework responses that did not come from an `AppError`
fn fallback_error(status: StatusCode) -> ErrorResponse {
    match status {
        StatusCode::NOT_FOUND => {
            ErrorResponse::new("NOT_FOUND", "The requested resource could not be found")
        }
        StatusCode::METHOD_NOT_ALLOWED => ErrorResponse::new(
            "METHOD_NOT_ALLOWED",
            "HTTP method not allowed for this endpoint",
        ),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            ErrorResponse::new("UNSUPPORTED_MEDIA_TYPE", "Unsupported media type")
        }
        StatusCode::REQUEST_TIMEOUT => ErrorResponse::new("REQUEST_TIMEOUT", "Request timeout"),
        StatusCode::PAYLOAD_TOO_LARGE => {
            ErrorResponse::new("PAYLOAD_TOO_LARGE", "Request payload too large")
        }
        s if s.is_server_error() => ErrorResponse::new(
            "INTERNAL_ERROR",
            "The server encountered a problem and could not process your request",
        ),
        _ => ErrorResponse::new("BAD_REQUEST", "Bad request"),
    }
}

fn has_json_body(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

/// Global error handling middleware.
///
/// Stamps the request id onto error bodies and converts non-JSON error
/// responses into `ErrorResponse`. Successful responses pass through.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().map(|r| r.0.clone());
    let mut response = next.run(request).await;

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let body = match response.extensions_mut().remove::<ErrorResponse>() {
        Some(body) => body,
        None if has_json_body(&response) => return response,
        None => fallback_error(status),
    };
    let body = match request_id {
        Some(ref id) => body.with_request_id(id),
        None => body,
    };

    let (parts, _) = response.into_parts();
    let mut rebuilt = Json(body).into_response();
    *rebuilt.status_mut() = parts.status;
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rebuilt.headers_mut().append(name, value.clone());
        }
    }
    rebuilt
}
