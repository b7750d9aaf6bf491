//! User repository for async database operations.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff_diesel::ToDiesel;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::{NewUser, TokenScope, User};
use crate::repositories::UserStore;
use crate::schema::{tokens, users};

/// Postgres user store holding an async connection pool.
///
/// `AsyncDbPool` is reference counted, so cloning the repository is cheap.
#[derive(Clone)]
pub struct UserRepository {
    pool: AsyncDbPool,
}

impl UserRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "insert user"))
    }

    async fn update_with_version_check(&self, user: &User) -> AppResult<User> {
        let mut conn = self.pool.get().await?;

        diesel::update(
            users::table
                .filter(users::id.eq(user.id))
                .filter(users::version.eq(user.version)),
        )
        .set((
            users::name.eq(&user.name),
            users::email.eq(&user.email),
            users::password_hash.eq(&user.password_hash),
            users::activated.eq(user.activated),
            users::version.eq(users::version + 1),
        ))
        .returning(User::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "update user"))?
        .ok_or_else(|| AppError::Conflict {
            entity: "user".to_string(),
            id: user.id.to_string(),
        })
    }

    async fn find_by_id(&self, user_id: i64) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::id.eq(user_id))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "find user by id"))
    }

    async fn find_by_name(&self, user_name: &str) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::name.eq(user_name))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "find user by name"))
    }

    async fn find_by_token(
        &self,
        scope: TokenScope,
        hash: &[u8],
        now: jiff::Timestamp,
    ) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .inner_join(tokens::table)
            .filter(tokens::hash.eq(hash))
            .filter(tokens::scope.eq(scope.as_str()))
            .filter(tokens::expiry.gt(now.to_diesel()))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "find user by token"))
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "ping"))
    }
}
