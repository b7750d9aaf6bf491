//! Token persistence and resolution on top of the token and user stores.

use std::sync::Arc;
use std::time::Duration;

use crate::db::with_deadline;
use crate::error::{AppError, AppResult};
use crate::models::{Token, TokenScope, User};
use crate::repositories::{Repositories, TokenStore, UserStore};
use crate::utils::TokenCodec;

/// A freshly issued token. `plaintext` is handed to the client once and
/// never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    pub plaintext: String,
    pub scope: TokenScope,
    pub expiry: jiff::Timestamp,
}

#[derive(Clone)]
pub struct TokenService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    deadline: Duration,
}

impl TokenService {
    /// `deadline` bounds every individual store call
    pub fn new(repos: &Repositories, deadline: Duration) -> Self {
        Self {
            users: repos.users.clone(),
            tokens: repos.tokens.clone(),
            deadline,
        }
    }

    pub async fn save(&self, token: Token) -> AppResult<()> {
        with_deadline(self.deadline, "insert token", self.tokens.insert(token)).await
    }

    /// Generate, persist and return a token for `user_id`
    pub async fn issue(&self, user_id: i64, ttl: Duration, scope: TokenScope) -> AppResult<IssuedToken> {
        let (plaintext, record) = TokenCodec::issue(user_id, ttl, scope)?;
        let expiry = record.expiry.to_jiff();
        self.save(record).await?;

        tracing::debug!(user_id, scope = %scope, expiry = %expiry, "Token issued");
        Ok(IssuedToken {
            plaintext,
            scope,
            expiry,
        })
    }

    /// Owner of a live token with this plaintext and scope.
    ///
    /// Unknown, expired and wrong-scope tokens all yield the same
    /// `AppError::TokenInvalid`.
    pub async fn resolve(&self, scope: TokenScope, plaintext: &str) -> AppResult<User> {
        if plaintext.is_empty() {
            return Err(AppError::TokenInvalid);
        }

        let hash = TokenCodec::hash(plaintext);
        let now = jiff::Timestamp::now();
        with_deadline(
            self.deadline,
            "find user by token",
            self.users.find_by_token(scope, &hash, now),
        )
        .await?
        .ok_or(AppError::TokenInvalid)
    }

    /// Delete every token of `user_id` in `scope`. Idempotent.
    pub async fn invalidate_all(&self, user_id: i64, scope: TokenScope) -> AppResult<usize> {
        with_deadline(
            self.deadline,
            "delete tokens for user",
            self.tokens.delete_all_for_user(user_id, scope),
        )
        .await
    }

    pub async fn purge_expired(&self) -> AppResult<usize> {
        with_deadline(
            self.deadline,
            "delete expired tokens",
            self.tokens.delete_expired(jiff::Timestamp::now()),
        )
        .await
    }
}
