use std::fmt;
use std::str::FromStr;

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stored form of an issued token. The plaintext is never persisted.
#[derive(Debug, Queryable, Selectable, Insertable, Clone, PartialEq)]
#[diesel(table_name = crate::schema::tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Token {
    /// SHA-256 of the plaintext
    pub hash: Vec<u8>,
    pub user_id: i64,
    pub expiry: Timestamp,
    pub scope: String,
}

impl Token {
    /// A token whose expiry is at or before `now` is dead
    pub fn is_live_at(&self, now: jiff::Timestamp) -> bool {
        now < self.expiry.to_jiff()
    }
}

/// Purpose a token was issued for; a token never redeems for another scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    Activation,
    Authentication,
}

impl TokenScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Activation => "activation",
            TokenScope::Authentication => "authentication",
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activation" => Ok(TokenScope::Activation),
            "authentication" => Ok(TokenScope::Authentication),
            other => Err(format!("unknown token scope '{}'", other)),
        }
    }
}
