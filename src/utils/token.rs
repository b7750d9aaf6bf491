use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jiff_diesel::ToDiesel;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};
use crate::models::{Token, TokenScope};

/// Random bytes behind each token; 256 bits
const TOKEN_BYTES: usize = 32;

/// Generates opaque bearer tokens and the digests they are stored under.
pub struct TokenCodec;

impl TokenCodec {
    /// A fresh URL-safe plaintext token from the thread-local CSPRNG
    pub fn generate() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// SHA-256 digest used both to store and to look up a token
    pub fn hash(plaintext: &str) -> Vec<u8> {
        Sha256::digest(plaintext.as_bytes()).to_vec()
    }

    /// Issue a token for `user_id` valid for `ttl` from now.
    ///
    /// Returns the plaintext, which the caller hands out exactly once, and
    /// the record to persist.
    pub fn issue(user_id: i64, ttl: Duration, scope: TokenScope) -> AppResult<(String, Token)> {
        Self::issue_at(user_id, ttl, scope, jiff::Timestamp::now())
    }

    pub fn issue_at(
        user_id: i64,
        ttl: Duration,
        scope: TokenScope,
        now: jiff::Timestamp,
    ) -> AppResult<(String, Token)> {
        let expiry = now.checked_add(ttl).map_err(|e| AppError::Internal {
            source: anyhow::Error::msg(format!("token expiry out of range: {}", e)),
        })?;

        let plaintext = Self::generate();
        let record = Token {
            hash: Self::hash(&plaintext),
            user_id,
            expiry: expiry.to_diesel(),
            scope: scope.as_str().to_string(),
        };
        Ok((plaintext, record))
    }
}
