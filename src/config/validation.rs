//! Configuration validation logic
//!
//! Validation methods for all configuration structures, run after loading and
//! again after CLI overrides are merged.

use tokio_cron_scheduler::Job;

use crate::config::error::ConfigError;
use crate::config::settings::{
    AuthConfig, DatabaseConfig, JobsConfig, LoggerSettings, NotificationConfig, SenderKind,
    ServerConfig, Settings, StorageBackend,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl ServerConfig {
    /// Validate server configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// The URL is only required for the postgres backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == StorageBackend::Postgres {
            if self.url.is_empty() {
                return Err(ConfigError::validation(
                    "database.url",
                    "Database URL is required for the postgres backend.",
                ));
            }

            if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
                return Err(ConfigError::validation(
                    "database.url",
                    "Invalid database URL format. Expected postgres://[user:password@]host[:port]/database",
                ));
            }
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::validation(
                "database.min_connections",
                "Min connections cannot exceed max connections.",
            ));
        }

        if self.statement_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "database.statement_timeout_ms",
                "Statement timeout must be greater than 0 milliseconds.",
            ));
        }

        Ok(())
    }
}

/// Ten years; expiry timestamps must stay representable
const MAX_TOKEN_TTL_HOURS: i64 = 10 * 365 * 24;

impl AuthConfig {
    /// Validate token lifetimes and Argon2 cost parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.activation_token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(ConfigError::validation(
                "auth.activation_token_ttl_hours",
                format!("Activation token lifetime cannot exceed {} hours.", MAX_TOKEN_TTL_HOURS),
            ));
        }

        if self.authentication_token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(ConfigError::validation(
                "auth.authentication_token_ttl_hours",
                format!("Authentication token lifetime cannot exceed {} hours.", MAX_TOKEN_TTL_HOURS),
            ));
        }

        if self.activation_token_ttl_hours <= 0 {
            return Err(ConfigError::validation(
                "auth.activation_token_ttl_hours",
                "Activation token lifetime must be positive.",
            ));
        }

        if self.authentication_token_ttl_hours <= 0 {
            return Err(ConfigError::validation(
                "auth.authentication_token_ttl_hours",
                "Authentication token lifetime must be positive.",
            ));
        }

        // Argon2 rejects m_cost below 8 KiB per lane
        if self.argon2_parallelism == 0 || self.argon2_memory_kib < 8 * self.argon2_parallelism {
            return Err(ConfigError::validation(
                "auth.argon2_memory_kib",
                "Argon2 memory must be at least 8 KiB per lane and parallelism at least 1.",
            ));
        }

        if self.argon2_iterations == 0 {
            return Err(ConfigError::validation(
                "auth.argon2_iterations",
                "Argon2 iterations must be at least 1.",
            ));
        }

        Ok(())
    }
}

impl NotificationConfig {
    /// Validate worker pool sizing and sender settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::validation(
                "notifications.workers",
                "At least one notification worker is required.",
            ));
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::validation(
                "notifications.queue_capacity",
                "Notification queue capacity must be greater than 0.",
            ));
        }

        if self.sender == SenderKind::Smtp {
            if self.smtp.host.is_empty() {
                return Err(ConfigError::validation(
                    "notifications.smtp.host",
                    "SMTP host is required when sender is smtp.",
                ));
            }
            if self.smtp.sender.is_empty() {
                return Err(ConfigError::validation(
                    "notifications.smtp.sender",
                    "SMTP sender address is required when sender is smtp.",
                ));
            }
        }

        Ok(())
    }
}

impl JobsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_purge_enabled {
            Job::new_async(self.token_purge_schedule.as_str(), |_, _| Box::pin(async {})).map_err(
                |e| {
                    ConfigError::validation(
                        "jobs.token_purge_schedule".to_string(),
                        format!("Invalid cron expression: {}", e),
                    )
                },
            )?;
        }
        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger level and file format
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.level".to_string(),
                format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.file.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format".to_string(),
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.file.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate every section, returning the first failure
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.notifications.validate()?;
        self.jobs.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.database.url = "postgres://localhost/knowstro".to_string();
        settings
    }

    fn failing_field(settings: &Settings) -> String {
        match settings.validate() {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_settings_with_url_are_valid() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_memory_backend_needs_no_url() {
        let mut settings = Settings::default();
        settings.database.backend = StorageBackend::Memory;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_postgres_backend_requires_url() {
        assert_eq!(failing_field(&Settings::default()), "database.url");
    }

    #[test]
    fn test_rejects_non_postgres_url() {
        let mut settings = valid_settings();
        settings.database.url = "mysql://localhost/db".to_string();
        assert_eq!(failing_field(&settings), "database.url");
    }

    #[test]
    fn test_rejects_zero_port() {
        let mut settings = valid_settings();
        settings.server.port = 0;
        assert_eq!(failing_field(&settings), "server.port");
    }

    #[test]
    fn test_rejects_min_connections_above_max() {
        let mut settings = valid_settings();
        settings.database.min_connections = 20;
        settings.database.max_connections = 5;
        assert_eq!(failing_field(&settings), "database.min_connections");
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        let mut settings = valid_settings();
        settings.auth.activation_token_ttl_hours = 0;
        assert_eq!(failing_field(&settings), "auth.activation_token_ttl_hours");

        let mut settings = valid_settings();
        settings.auth.authentication_token_ttl_hours = -1;
        assert_eq!(failing_field(&settings), "auth.authentication_token_ttl_hours");
    }

    #[test]
    fn test_rejects_ttl_beyond_ten_years() {
        let mut settings = valid_settings();
        settings.auth.activation_token_ttl_hours = i64::MAX;
        assert_eq!(failing_field(&settings), "auth.activation_token_ttl_hours");

        let mut settings = valid_settings();
        settings.auth.authentication_token_ttl_hours = MAX_TOKEN_TTL_HOURS + 1;
        assert_eq!(failing_field(&settings), "auth.authentication_token_ttl_hours");

        let mut settings = valid_settings();
        settings.auth.authentication_token_ttl_hours = MAX_TOKEN_TTL_HOURS;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_workers_and_capacity() {
        let mut settings = valid_settings();
        settings.notifications.workers = 0;
        assert_eq!(failing_field(&settings), "notifications.workers");

        let mut settings = valid_settings();
        settings.notifications.queue_capacity = 0;
        assert_eq!(failing_field(&settings), "notifications.queue_capacity");
    }

    #[test]
    fn test_smtp_sender_requires_host() {
        let mut settings = valid_settings();
        settings.notifications.sender = SenderKind::Smtp;
        assert_eq!(failing_field(&settings), "notifications.smtp.host");

        settings.notifications.smtp.host = "smtp.example.com".to_string();
        assert_eq!(failing_field(&settings), "notifications.smtp.sender");

        settings.notifications.smtp.sender = "no-reply@example.com".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rejects_invalid_cron_expression() {
        let mut settings = valid_settings();
        settings.jobs.token_purge_schedule = "every hour".to_string();
        assert_eq!(failing_field(&settings), "jobs.token_purge_schedule");

        settings.jobs.token_purge_enabled = false;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rejects_invalid_log_level() {
        let mut settings = valid_settings();
        settings.logger.level = "loud".to_string();
        assert_eq!(failing_field(&settings), "logger.level");
    }
}
