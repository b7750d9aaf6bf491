//! Bearer token authentication.
//!
//! `authenticate` runs on every request and attaches exactly one
//! [`Principal`] to the request extensions. Handlers pick it up through the
//! `Principal`, [`AuthenticatedUser`] or [`ActivatedUser`] extractors.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{AppError, AppResult};
use crate::models::{Principal, User};
use crate::services::AuthService;
use crate::state::AppState;

/// Resolve the `Authorization` header to a principal.
///
/// - no header (or an empty one): `Principal::Anonymous`
/// - anything other than `Bearer <token>`: `AppError::MalformedCredential`
/// - a token that does not resolve: `AppError::Unauthenticated`
///
/// Nothing is cached; every request looks the token up again.
pub async fn resolve_principal(auth: &AuthService, headers: &HeaderMap) -> AppResult<Principal> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(Principal::Anonymous);
    };
    let value = value.to_str().map_err(|_| AppError::MalformedCredential)?;
    if value.is_empty() {
        return Ok(Principal::Anonymous);
    }

    let token = parse_bearer(value)?;
    let user = auth.authenticate_bearer(token).await?;
    Ok(Principal::User(user))
}

/// Split `Bearer <token>` into its token; exactly two space-separated parts
fn parse_bearer(value: &str) -> AppResult<&str> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AppError::MalformedCredential),
    }
}

/// Authentication middleware.
///
/// Rejected credentials never reach a handler. Every response, including
/// rejections, varies on `Authorization`.
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let mut response = match resolve_principal(&state.services.auth, request.headers()).await {
        Ok(principal) => {
            if let Some(user) = principal.user() {
                tracing::debug!(user_id = user.id, "Request authenticated");
            }
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    };

    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> AppResult<Self> {
        Ok(parts
            .extensions
            .get::<Principal>()
            .cloned()
            .unwrap_or_default())
    }
}

/// A signed-in user; anonymous requests are rejected with 401
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        Principal::from_request_parts(parts, state)
            .await?
            .into_user()
            .map(AuthenticatedUser)
            .ok_or(AppError::Unauthenticated)
    }
}

/// A signed-in user whose account is activated; otherwise 403
#[derive(Debug, Clone)]
pub struct ActivatedUser(pub User);

impl<S> FromRequestParts<S> for ActivatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !user.activated {
            return Err(AppError::InactiveAccount);
        }
        Ok(ActivatedUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenScope;
    use crate::state::testing::test_app;
    use std::time::Duration;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc").unwrap(), "abc");

        for bad in ["Bearer", "Bearer ", "bearer abc", "Basic abc", "Bearer a b", "Bearer  abc", "abc"] {
            assert!(
                matches!(parse_bearer(bad), Err(AppError::MalformedCredential)),
                "{:?} should be malformed",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_missing_header_is_anonymous() {
        let app = test_app();
        let principal = resolve_principal(&app.state.services.auth, &HeaderMap::new())
            .await
            .unwrap();
        assert!(principal.is_anonymous());

        let empty = resolve_principal(&app.state.services.auth, &headers(""))
            .await
            .unwrap();
        assert!(empty.is_anonymous());
    }

    #[tokio::test]
    async fn test_malformed_header() {
        let app = test_app();
        let err = resolve_principal(&app.state.services.auth, &headers("Token abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedCredential));
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthenticated() {
        let app = test_app();
        let err = resolve_principal(&app.state.services.auth, &headers("Bearer nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_valid_token_resolves_user() {
        let app = test_app();
        let registration = app
            .state
            .services
            .auth
            .register("alice", "a@x.com", "pw123456")
            .await
            .unwrap();
        let issued = app
            .state
            .services
            .tokens
            .issue(registration.user.id, Duration::from_secs(60), TokenScope::Authentication)
            .await
            .unwrap();

        let principal = resolve_principal(
            &app.state.services.auth,
            &headers(&format!("Bearer {}", issued.plaintext)),
        )
        .await
        .unwrap();
        assert_eq!(principal.user().map(|u| u.id), Some(registration.user.id));
    }
}
