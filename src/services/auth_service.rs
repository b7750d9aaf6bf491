//! Account lifecycle: registration, login, activation and bearer resolution.
//!
//! An account is created unactivated and moves to activated only by
//! redeeming an activation-scoped token. There is no transition back.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::db::with_deadline;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, TokenScope, User};
use crate::repositories::{Repositories, UserStore};
use crate::services::notifications::{MailTemplate, NotificationDispatcher};
use crate::services::token_service::{IssuedToken, TokenService};
use crate::utils::PasswordHasher;

/// Lifetimes and mail details the service needs from configuration
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    pub activation_ttl: Duration,
    pub authentication_ttl: Duration,
    pub app_name: String,
    pub activation_url: String,
}

impl AuthPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            activation_ttl: settings.auth.activation_ttl(),
            authentication_ttl: settings.auth.authentication_ttl(),
            app_name: settings.application.name.clone(),
            activation_url: settings.notifications.activation_url.clone(),
        }
    }
}

/// Outcome of a successful registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub activation_token: IssuedToken,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenService,
    hasher: PasswordHasher,
    notifier: NotificationDispatcher,
    policy: AuthPolicy,
    deadline: Duration,
}

impl AuthService {
    pub fn new(
        repos: &Repositories,
        tokens: TokenService,
        hasher: PasswordHasher,
        notifier: NotificationDispatcher,
        policy: AuthPolicy,
        deadline: Duration,
    ) -> Self {
        Self {
            users: repos.users.clone(),
            tokens,
            hasher,
            notifier,
            policy,
            deadline,
        }
    }

    /// Create an unactivated account and mail it an activation token.
    ///
    /// Uniqueness is left to the store, so two concurrent registrations with
    /// the same email produce exactly one `AppError::Duplicate`. The welcome
    /// mail is queued and never affects the result.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> AppResult<Registration> {
        let password_hash = self.hasher.hash_blocking(password.to_string()).await?;

        let new_user = NewUser {
            name: name.to_string(),
            email: normalize_email(email),
            password_hash,
        };
        let user = with_deadline(self.deadline, "insert user", self.users.create(new_user)).await?;

        let activation_token = self
            .tokens
            .issue(user.id, self.policy.activation_ttl, TokenScope::Activation)
            .await?;

        let queued = self.notifier.submit(
            user.email.clone(),
            MailTemplate::UserWelcome {
                app_name: self.policy.app_name.clone(),
                user_name: user.name.clone(),
                activation_url: self.policy.activation_url.clone(),
                token: activation_token.plaintext.clone(),
                valid_hours: (self.policy.activation_ttl.as_secs() / 3600) as i64,
            },
        );

        tracing::info!(user_id = user.id, welcome_queued = queued, "User registered");
        Ok(Registration {
            user,
            activation_token,
        })
    }

    /// Exchange a name and password for an authentication token.
    ///
    /// Unknown name and wrong password both return
    /// `AppError::InvalidCredentials` after one Argon2 verification.
    /// Activation is not required.
    pub async fn login(&self, name: &str, password: &str) -> AppResult<IssuedToken> {
        let user = with_deadline(self.deadline, "find user by name", self.users.find_by_name(name)).await?;

        let Some(user) = user else {
            self.hasher.verify_dummy(password.to_string()).await?;
            tracing::debug!("Login rejected");
            return Err(AppError::InvalidCredentials);
        };

        let matched = self
            .hasher
            .verify_blocking(user.password_hash.clone(), password.to_string())
            .await?;
        if !matched {
            tracing::debug!(user_id = user.id, "Login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(user.id, self.policy.authentication_ttl, TokenScope::Authentication)
            .await?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(token)
    }

    /// Redeem an activation token.
    ///
    /// On success every outstanding activation token of the account is
    /// deleted; a failure to delete them is logged and the activated account
    /// is still returned.
    pub async fn activate(&self, token_plaintext: &str) -> AppResult<User> {
        let mut user = self
            .tokens
            .resolve(TokenScope::Activation, token_plaintext)
            .await?;

        if !user.activated {
            user.activated = true;
            user = match with_deadline(
                self.deadline,
                "update user",
                self.users.update_with_version_check(&user),
            )
            .await
            {
                Ok(updated) => updated,
                Err(AppError::Conflict { entity, id }) => {
                    // A concurrent writer won; fine if it already activated the account
                    let current =
                        with_deadline(self.deadline, "find user by id", self.users.find_by_id(user.id))
                            .await?;
                    match current {
                        Some(current) if current.activated => current,
                        _ => return Err(AppError::Conflict { entity, id }),
                    }
                }
                Err(e) => return Err(e),
            };
        }

        if let Err(e) = self
            .tokens
            .invalidate_all(user.id, TokenScope::Activation)
            .await
        {
            tracing::warn!(user_id = user.id, error = %e, "Failed to invalidate activation tokens");
        }

        tracing::info!(user_id = user.id, "User activated");
        Ok(user)
    }

    /// Owner of a bearer token presented on a request.
    ///
    /// Any resolution failure becomes `AppError::Unauthenticated`; store
    /// outages keep their own classification.
    pub async fn authenticate_bearer(&self, token_plaintext: &str) -> AppResult<User> {
        match self
            .tokens
            .resolve(TokenScope::Authentication, token_plaintext)
            .await
        {
            Ok(user) => Ok(user),
            Err(AppError::TokenInvalid) => Err(AppError::Unauthenticated),
            Err(e) => Err(e),
        }
    }

    pub async fn find_user(&self, id: i64) -> AppResult<User> {
        with_deadline(self.deadline, "find user by id", self.users.find_by_id(id))
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: "user".to_string(),
                field: "id".to_string(),
                value: id.to_string(),
            })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MemoryStore, TokenStore};
    use crate::services::notifications::testing::RecordingSender;
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    struct Harness {
        service: AuthService,
        store: MemoryStore,
        mail: Arc<RecordingSender>,
    }

    fn policy() -> AuthPolicy {
        AuthPolicy {
            activation_ttl: Duration::from_secs(72 * 3600),
            authentication_ttl: Duration::from_secs(24 * 3600),
            app_name: "Knowstro".to_string(),
            activation_url: "http://localhost:8080/v1/users/activated".to_string(),
        }
    }

    fn build(users: Arc<dyn UserStore>, store: MemoryStore, deadline: Duration) -> Harness {
        let repos = Repositories {
            users,
            tokens: Arc::new(store.clone()),
        };
        let mail = Arc::new(RecordingSender::default());
        let (notifier, _) =
            NotificationDispatcher::start(mail.clone(), 1, 16, CancellationToken::new());
        let tokens = TokenService::new(&repos, deadline);
        let hasher = PasswordHasher::new(64, 1, 1).unwrap();
        Harness {
            service: AuthService::new(&repos, tokens, hasher, notifier, policy(), deadline),
            store,
            mail,
        }
    }

    fn harness() -> Harness {
        let store = MemoryStore::new();
        build(Arc::new(store.clone()), store, Duration::from_secs(3))
    }

    #[tokio::test]
    async fn test_register_login_activate_scenario() {
        let h = harness();

        let registration = h.service.register("alice", "a@x.com", "pw123456").await.unwrap();
        assert!(!registration.user.activated);
        assert_eq!(registration.activation_token.scope, TokenScope::Activation);
        assert!(!registration.user.password_hash.contains("pw123456"));

        // Login does not require activation
        let auth = h.service.login("alice", "pw123456").await.unwrap();
        assert_eq!(auth.scope, TokenScope::Authentication);

        let activated = h
            .service
            .activate(&registration.activation_token.plaintext)
            .await
            .unwrap();
        assert!(activated.activated);
        assert_eq!(activated.version, registration.user.version + 1);

        let again = h
            .service
            .activate(&registration.activation_token.plaintext)
            .await
            .unwrap_err();
        assert!(matches!(again, AppError::TokenInvalid));

        // The authentication token is untouched by activation
        let me = h.service.authenticate_bearer(&auth.plaintext).await.unwrap();
        assert_eq!(me.id, activated.id);
    }

    #[tokio::test]
    async fn test_register_queues_welcome_mail_with_token() {
        let h = harness();
        let registration = h.service.register("alice", " A@X.com ", "pw123456").await.unwrap();
        assert_eq!(registration.user.email, "a@x.com");

        let sent = h.mail.wait_for(1, Duration::from_secs(2)).await;
        assert_eq!(sent.len(), 1);
        let (recipient, template) = &sent[0];
        assert_eq!(recipient, "a@x.com");
        match template {
            MailTemplate::UserWelcome {
                user_name, token, ..
            } => {
                assert_eq!(user_name, "alice");
                assert_eq!(token, &registration.activation_token.plaintext);
            }
        }
    }

    #[tokio::test]
    async fn test_duplicate_registrations() {
        let h = harness();
        h.service.register("alice", "a@x.com", "pw123456").await.unwrap();

        let dup_name = h.service.register("alice", "other@x.com", "pw123456").await.unwrap_err();
        assert!(dup_name.is_duplicate("name"));

        let dup_email = h.service.register("bob", "A@x.com", "pw123456").await.unwrap_err();
        assert!(dup_email.is_duplicate("email"));
    }

    #[tokio::test]
    async fn test_concurrent_same_email_yields_one_duplicate() {
        let h = harness();
        let first = h.service.clone();
        let second = h.service.clone();

        let (a, b) = tokio::join!(
            first.register("alice", "same@x.com", "pw123456"),
            second.register("bob", "same@x.com", "pw654321"),
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(e) if e.is_duplicate("email")))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_login_failures_are_undifferentiated() {
        let h = harness();
        h.service.register("alice", "a@x.com", "pw123456").await.unwrap();

        let wrong_password = h.service.login("alice", "nope-nope").await.unwrap_err();
        let unknown_user = h.service.login("mallory", "pw123456").await.unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_user, AppError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_activation_token_cannot_authenticate() {
        let h = harness();
        let registration = h.service.register("alice", "a@x.com", "pw123456").await.unwrap();

        let err = h
            .service
            .authenticate_bearer(&registration.activation_token.plaintext)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_activation_invalidates_sibling_tokens() {
        let h = harness();
        let registration = h.service.register("alice", "a@x.com", "pw123456").await.unwrap();
        let sibling = h
            .service
            .tokens
            .issue(registration.user.id, Duration::from_secs(3600), TokenScope::Activation)
            .await
            .unwrap();

        h.service
            .activate(&registration.activation_token.plaintext)
            .await
            .unwrap();

        let err = h.service.activate(&sibling.plaintext).await.unwrap_err();
        assert!(matches!(err, AppError::TokenInvalid));
    }

    #[tokio::test]
    async fn test_second_token_for_activated_account_is_a_no_op() {
        let h = harness();
        let registration = h.service.register("alice", "a@x.com", "pw123456").await.unwrap();
        let activated = h
            .service
            .activate(&registration.activation_token.plaintext)
            .await
            .unwrap();

        // Issued after activation, so invalidation did not catch it
        let late = h
            .service
            .tokens
            .issue(activated.id, Duration::from_secs(3600), TokenScope::Activation)
            .await
            .unwrap();
        let again = h.service.activate(&late.plaintext).await.unwrap();
        assert!(again.activated);
        assert_eq!(again.version, activated.version);
    }

    #[tokio::test]
    async fn test_back_to_back_activation_with_two_tokens() {
        let h = harness();
        let registration = h.service.register("alice", "a@x.com", "pw123456").await.unwrap();
        let second = h
            .service
            .tokens
            .issue(registration.user.id, Duration::from_secs(3600), TokenScope::Activation)
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            h.service.activate(&registration.activation_token.plaintext),
            h.service.activate(&second.plaintext),
        );

        // Either both see the activated account, or the late one finds its token already gone
        for result in [a, b] {
            match result {
                Ok(user) => assert!(user.activated),
                Err(e) => assert!(matches!(e, AppError::TokenInvalid)),
            }
        }
        let stored = h.service.find_user(registration.user.id).await.unwrap();
        assert!(stored.activated);
        assert_eq!(stored.version, 2);
    }

    /// Lets a rival writer update the account between the caller's read and
    /// its versioned write, so the caller's write always goes in stale
    struct RacingUsers {
        inner: MemoryStore,
        rival_activates: bool,
    }

    #[async_trait]
    impl UserStore for RacingUsers {
        async fn create(&self, new_user: NewUser) -> AppResult<User> {
            self.inner.create(new_user).await
        }
        async fn update_with_version_check(&self, user: &User) -> AppResult<User> {
            let mut rival = self.inner.find_by_id(user.id).await?.unwrap();
            rival.activated = self.rival_activates;
            self.inner.update_with_version_check(&rival).await?;
            self.inner.update_with_version_check(user).await
        }
        async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
            self.inner.find_by_id(id).await
        }
        async fn find_by_name(&self, name: &str) -> AppResult<Option<User>> {
            self.inner.find_by_name(name).await
        }
        async fn find_by_token(
            &self,
            scope: TokenScope,
            hash: &[u8],
            now: jiff::Timestamp,
        ) -> AppResult<Option<User>> {
            self.inner.find_by_token(scope, hash, now).await
        }
        async fn ping(&self) -> AppResult<()> {
            Ok(())
        }
    }

    fn racing_harness(rival_activates: bool) -> Harness {
        let store = MemoryStore::new();
        let users = RacingUsers {
            inner: store.clone(),
            rival_activates,
        };
        build(Arc::new(users), store, Duration::from_secs(3))
    }

    #[tokio::test]
    async fn test_lost_version_race_to_activating_writer_converges() {
        let h = racing_harness(true);
        let registration = h.service.register("alice", "a@x.com", "pw123456").await.unwrap();

        let user = h
            .service
            .activate(&registration.activation_token.plaintext)
            .await
            .unwrap();
        assert!(user.activated);
        assert_eq!(user.version, 2);
        assert_eq!(h.store.token_count(), 0);
    }

    #[tokio::test]
    async fn test_lost_version_race_to_other_writer_is_a_conflict() {
        let h = racing_harness(false);
        let registration = h.service.register("alice", "a@x.com", "pw123456").await.unwrap();

        let err = h
            .service
            .activate(&registration.activation_token.plaintext)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        let stored = h.service.find_user(registration.user.id).await.unwrap();
        assert!(!stored.activated);
        // The token survives so the client can retry
        assert_eq!(h.store.token_count(), 1);
    }

    /// Delegates to a MemoryStore but stalls name lookups
    struct StallingUsers(MemoryStore);

    #[async_trait]
    impl UserStore for StallingUsers {
        async fn create(&self, new_user: NewUser) -> AppResult<User> {
            self.0.create(new_user).await
        }
        async fn update_with_version_check(&self, user: &User) -> AppResult<User> {
            self.0.update_with_version_check(user).await
        }
        async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
            self.0.find_by_id(id).await
        }
        async fn find_by_name(&self, _name: &str) -> AppResult<Option<User>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        }
        async fn find_by_token(
            &self,
            scope: TokenScope,
            hash: &[u8],
            now: jiff::Timestamp,
        ) -> AppResult<Option<User>> {
            self.0.find_by_token(scope, hash, now).await
        }
        async fn ping(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stalled_store_times_out() {
        let store = MemoryStore::new();
        let h = build(
            Arc::new(StallingUsers(store.clone())),
            store,
            Duration::from_millis(50),
        );

        let err = h.service.login("alice", "pw123456").await.unwrap_err();
        assert!(matches!(err, AppError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_expired_tokens_are_purged_but_live_ones_kept() {
        let h = harness();
        let registration = h.service.register("alice", "a@x.com", "pw123456").await.unwrap();
        h.store
            .delete_expired(jiff::Timestamp::now())
            .await
            .unwrap();
        assert_eq!(h.store.token_count(), 1);
        assert!(h
            .service
            .activate(&registration.activation_token.plaintext)
            .await
            .is_ok());
    }
}
