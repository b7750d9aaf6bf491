use std::sync::{Arc, OnceLock};

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHasher as _, PasswordVerifier, phc::PasswordHash},
};

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};

/// Argon2id password hashing with configurable cost.
///
/// Hashes are PHC strings carrying their own parameters, so credentials
/// created under older settings still verify after the cost changes.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    dummy_hash: Arc<OnceLock<String>>,
}

impl PasswordHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> AppResult<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|e| {
            AppError::Configuration {
                key: "auth.argon2".to_string(),
                source: anyhow::Error::msg(e.to_string()),
            }
        })?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_hash: Arc::new(OnceLock::new()),
        })
    }

    pub fn from_config(config: &AuthConfig) -> AppResult<Self> {
        Self::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
        )
    }

    /// Hash a plaintext password with a fresh random salt
    ///
    /// # Example
    /// ```
    /// use knowstro_rs::utils::PasswordHasher;
    ///
    /// let hasher = PasswordHasher::new(64, 1, 1).unwrap();
    /// let credential = hasher.hash("correct horse").unwrap();
    /// assert!(hasher.verify(&credential, "correct horse").unwrap());
    /// ```
    pub fn hash(&self, plaintext: &str) -> AppResult<String> {
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes())
            .map_err(|e| AppError::PasswordHash {
                source: anyhow::Error::msg(e.to_string()),
            })?;
        Ok(hash.to_string())
    }

    /// Check `plaintext` against a stored credential.
    ///
    /// A mismatch is `Ok(false)`; only a credential that does not parse as a
    /// PHC string is an error.
    pub fn verify(&self, credential: &str, plaintext: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(credential).map_err(|e| AppError::CorruptCredential {
            source: anyhow::Error::msg(e.to_string()),
        })?;

        Ok(self
            .argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }

    /// `hash` on the blocking pool
    pub async fn hash_blocking(&self, plaintext: String) -> AppResult<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?
    }

    /// `verify` on the blocking pool
    pub async fn verify_blocking(&self, credential: String, plaintext: String) -> AppResult<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&credential, &plaintext))
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?
    }

    /// Spend one verification on a throwaway hash.
    ///
    /// Login calls this when the account does not exist so that both
    /// rejection paths cost the same.
    pub async fn verify_dummy(&self, plaintext: String) -> AppResult<()> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || -> AppResult<()> {
            let dummy = match hasher.dummy_hash.get() {
                Some(hash) => hash.clone(),
                None => {
                    let hash = hasher.hash("knowstro-dummy-credential")?;
                    hasher.dummy_hash.get_or_init(|| hash).clone()
                }
            };
            hasher.verify(&dummy, &plaintext)?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}
