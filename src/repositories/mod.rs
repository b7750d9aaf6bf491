//! Repository layer for data access operations.
//!
//! `UserStore` and `TokenStore` are the storage contracts the services depend
//! on. Postgres implementations use diesel_async; `MemoryStore` implements
//! both over DashMap for the `memory` backend and for tests.

mod memory;
mod token_repo;
mod user_repo;

pub use memory::MemoryStore;
pub use token_repo::TokenRepository;
pub use user_repo::UserRepository;

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::AsyncDbPool;
use crate::error::AppResult;
use crate::models::{NewUser, Token, TokenScope, User};

/// Account storage.
///
/// Implementations must report a unique violation as `AppError::Duplicate`
/// with `field` set to `name` or `email`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new_user: NewUser) -> AppResult<User>;

    /// Persist `user` only if the stored version still equals `user.version`.
    /// Bumps the version; a stale version yields `AppError::Conflict`.
    async fn update_with_version_check(&self, user: &User) -> AppResult<User>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    async fn find_by_name(&self, name: &str) -> AppResult<Option<User>>;

    /// Owner of a live token with this hash and scope
    async fn find_by_token(
        &self,
        scope: TokenScope,
        hash: &[u8],
        now: jiff::Timestamp,
    ) -> AppResult<Option<User>>;

    /// Cheap round trip used by the health check
    async fn ping(&self) -> AppResult<()>;
}

/// Token record storage
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, token: Token) -> AppResult<()>;

    /// Remove every token of `user_id` in `scope`; returns how many went away
    async fn delete_all_for_user(&self, user_id: i64, scope: TokenScope) -> AppResult<usize>;

    /// Remove tokens with `expiry <= now`
    async fn delete_expired(&self, now: jiff::Timestamp) -> AppResult<usize>;
}

/// Aggregates the stores for convenient access.
///
/// Cloning shares the underlying stores.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
}

impl Repositories {
    /// Postgres-backed stores sharing one connection pool
    pub fn postgres(pool: AsyncDbPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            tokens: Arc::new(TokenRepository::new(pool)),
        }
    }

    /// Process-local stores; nothing survives a restart
    pub fn in_memory() -> Self {
        Self::from_store(MemoryStore::new())
    }

    /// Both stores served by one shared `MemoryStore`
    pub fn from_store(store: MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            tokens: Arc::new(store),
        }
    }
}
