//! In-memory stores backed by DashMap.
//!
//! Enforces the same rules as the Postgres schema: unique name, unique
//! email, version-checked updates and scope/expiry filtered token lookup.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use jiff_diesel::ToDiesel;

use crate::error::{AppError, AppResult};
use crate::models::{NewUser, Token, TokenScope, User};
use crate::repositories::{TokenStore, UserStore};

#[derive(Default)]
struct MemoryState {
    next_id: AtomicI64,
    users: DashMap<i64, User>,
    /// Unique index on users.name
    names: DashMap<String, i64>,
    /// Unique index on users.email
    emails: DashMap<String, i64>,
    tokens: DashMap<Vec<u8>, Token>,
}

/// Shared handle; clones see the same data
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` in a unique index for `id`
    fn reserve(index: &DashMap<String, i64>, field: &str, key: &str, id: i64) -> AppResult<()> {
        match index.entry(key.to_string()) {
            Entry::Occupied(_) => Err(AppError::duplicate_user(field, key)),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }

    pub fn token_count(&self) -> usize {
        self.state.tokens.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let state = &self.state;
        let id = state.next_id.fetch_add(1, Ordering::SeqCst) + 1;

        Self::reserve(&state.names, "name", &new_user.name, id)?;
        if let Err(e) = Self::reserve(&state.emails, "email", &new_user.email, id) {
            state.names.remove(&new_user.name);
            return Err(e);
        }

        let user = User {
            id,
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            activated: false,
            version: 1,
            created_at: jiff::Timestamp::now().to_diesel(),
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_with_version_check(&self, user: &User) -> AppResult<User> {
        let state = &self.state;
        let conflict = || AppError::Conflict {
            entity: "user".to_string(),
            id: user.id.to_string(),
        };

        let mut stored = state.users.get_mut(&user.id).ok_or_else(conflict)?;
        if stored.version != user.version {
            return Err(conflict());
        }

        if stored.name != user.name {
            Self::reserve(&state.names, "name", &user.name, user.id)?;
            state.names.remove(&stored.name);
        }
        if stored.email != user.email {
            Self::reserve(&state.emails, "email", &user.email, user.id)?;
            state.emails.remove(&stored.email);
        }

        stored.name = user.name.clone();
        stored.email = user.email.clone();
        stored.password_hash = user.password_hash.clone();
        stored.activated = user.activated;
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.state.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<User>> {
        let Some(id) = self.state.names.get(name).map(|id| *id) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn find_by_token(
        &self,
        scope: TokenScope,
        hash: &[u8],
        now: jiff::Timestamp,
    ) -> AppResult<Option<User>> {
        let owner = self
            .state
            .tokens
            .get(hash)
            .filter(|t| t.scope == scope.as_str() && t.is_live_at(now))
            .map(|t| t.user_id);

        match owner {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert(&self, token: Token) -> AppResult<()> {
        if !self.state.users.contains_key(&token.user_id) {
            return Err(AppError::NotFound {
                entity: "user".to_string(),
                field: "id".to_string(),
                value: token.user_id.to_string(),
            });
        }
        self.state.tokens.insert(token.hash.clone(), token);
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: i64, scope: TokenScope) -> AppResult<usize> {
        let mut removed = 0;
        self.state.tokens.retain(|_, t| {
            let doomed = t.user_id == user_id && t.scope == scope.as_str();
            if doomed {
                removed += 1;
            }
            !doomed
        });
        Ok(removed)
    }

    async fn delete_expired(&self, now: jiff::Timestamp) -> AppResult<usize> {
        let mut removed = 0;
        self.state.tokens.retain(|_, t| {
            let live = t.is_live_at(now);
            if !live {
                removed += 1;
            }
            live
        });
        Ok(removed)
    }
}
