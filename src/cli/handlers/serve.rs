//! `serve` command: dry-run validation

use crate::config::StorageBackend;
use crate::config::settings::Settings;
use crate::error::AppResult;

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// With `dry_run` the configuration is validated and summarised on
    /// stdout. Otherwise nothing happens here and the caller starts the server.
    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            self.validate_only()
        } else {
            Ok(())
        }
    }

    fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;

        let backend = match self.config.database.backend {
            StorageBackend::Postgres => "postgres",
            StorageBackend::Memory => "memory",
        };

        println!("✓ Configuration is valid");
        println!("✓ Environment: {}", self.config.application.environment);
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!("✓ Storage backend: {}", backend);
        println!("✓ Notification sender: {:?}", self.config.notifications.sender);
        println!(
            "✓ Token lifetimes: activation {}h, authentication {}h",
            self.config.auth.activation_token_ttl_hours,
            self.config.auth.authentication_token_ttl_hours
        );
        println!("Dry run completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/knowstro".to_string();
        config
    }

    #[tokio::test]
    async fn test_dry_run_accepts_valid_config() {
        let handler = ServeCommandHandler::new(valid_config());
        assert_eq!(handler.config(), &valid_config());
        assert!(handler.execute(true).await.is_ok());
    }

    #[tokio::test]
    async fn test_dry_run_rejects_invalid_config() {
        let mut config = valid_config();
        config.server.port = 0;
        let handler = ServeCommandHandler::new(config);
        assert!(handler.execute(true).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_backend_needs_no_url() {
        let mut config = Settings::default();
        config.database.backend = StorageBackend::Memory;
        config.database.url = String::new();
        assert!(ServeCommandHandler::new(config).execute(true).await.is_ok());
    }
}
