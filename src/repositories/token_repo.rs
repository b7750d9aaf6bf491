use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff_diesel::ToDiesel;

use crate::db::AsyncDbPool;
use crate::error::{AppResult, DatabaseErrorConverter};
use crate::models::{Token, TokenScope};
use crate::repositories::TokenStore;
use crate::schema::tokens;

/// Postgres token store
#[derive(Clone)]
pub struct TokenRepository {
    pool: AsyncDbPool,
}

impl TokenRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for TokenRepository {
    async fn insert(&self, token: Token) -> AppResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(tokens::table)
            .values(&token)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "insert token"))
    }

    async fn delete_all_for_user(&self, user_id: i64, scope: TokenScope) -> AppResult<usize> {
        let mut conn = self.pool.get().await?;

        diesel::delete(
            tokens::table
                .filter(tokens::user_id.eq(user_id))
                .filter(tokens::scope.eq(scope.as_str())),
        )
        .execute(&mut conn)
        .await
        .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "delete tokens for user"))
    }

    async fn delete_expired(&self, now: jiff::Timestamp) -> AppResult<usize> {
        let mut conn = self.pool.get().await?;

        diesel::delete(tokens::table.filter(tokens::expiry.le(now.to_diesel())))
            .execute(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "delete expired tokens"))
    }
}
