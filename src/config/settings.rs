//! Configuration settings structures for knowstro-rs
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::environment::Environment;
use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "knowstro".to_string()
}

fn default_app_version() -> String {
    crate::build::PKG_VERSION.to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_statement_timeout_ms() -> u64 {
    3_000
}

fn default_activation_ttl_hours() -> i64 {
    72
}

fn default_authentication_ttl_hours() -> i64 {
    24
}

fn default_argon2_memory_kib() -> u32 {
    19 * 1024
}

fn default_argon2_iterations() -> u32 {
    2
}

fn default_argon2_parallelism() -> u32 {
    1
}

fn default_workers() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    256
}

fn default_smtp_port() -> u16 {
    587
}

fn default_activation_url() -> String {
    "http://localhost:8080/v1/users/activated".to_string()
}

fn default_token_purge_schedule() -> String {
    "0 0 * * * *".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/app.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name, also used in outgoing mail
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,

    /// Resolved by the loader from `KNOWSTRO_APP_ENV` or `--env`
    #[serde(skip)]
    pub environment: Environment,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
            environment: Environment::default(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// Which implementation backs the user and token stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local maps; state is lost on restart
    Memory,
}

/// Diesel database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Deadline for a single store call in milliseconds
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            statement_timeout_ms: default_statement_timeout_ms(),
        }
    }
}

// ============================================================================
// Auth Configuration
// ============================================================================

/// Token lifetimes and password hashing cost
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of activation tokens in hours
    #[serde(default = "default_activation_ttl_hours")]
    pub activation_token_ttl_hours: i64,

    /// Lifetime of authentication (bearer) tokens in hours
    #[serde(default = "default_authentication_ttl_hours")]
    pub authentication_token_ttl_hours: i64,

    /// Argon2id memory cost in KiB
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2id iteration count
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2id lanes
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Echo the activation token in the registration response.
    /// Only meant for development and test environments.
    #[serde(default)]
    pub expose_activation_token: bool,
}

impl AuthConfig {
    pub fn activation_ttl(&self) -> Duration {
        hours(self.activation_token_ttl_hours)
    }

    pub fn authentication_ttl(&self) -> Duration {
        hours(self.authentication_token_ttl_hours)
    }
}

/// Negative counts clamp to zero, huge ones saturate
fn hours(count: i64) -> Duration {
    Duration::from_secs((count.max(0) as u64).saturating_mul(3600))
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            activation_token_ttl_hours: default_activation_ttl_hours(),
            authentication_token_ttl_hours: default_authentication_ttl_hours(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            expose_activation_token: false,
        }
    }
}

// ============================================================================
// Notification Configuration
// ============================================================================

/// Which sender delivers outgoing notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    Smtp,
    /// Write rendered messages to the log instead of sending them
    #[default]
    Log,
}

/// SMTP relay settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// From address, e.g. `Knowstro <no-reply@knowstro.dev>`
    #[serde(default)]
    pub sender: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            sender: String::new(),
        }
    }
}

/// Notification worker pool and delivery settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Number of worker tasks draining the queue
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Maximum number of queued notifications before new ones are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default)]
    pub sender: SenderKind,

    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Link included in the welcome mail next to the activation token
    #[serde(default = "default_activation_url")]
    pub activation_url: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            sender: SenderKind::default(),
            smtp: SmtpConfig::default(),
            activation_url: default_activation_url(),
        }
    }
}

// ============================================================================
// Jobs Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Periodically delete expired tokens
    #[serde(default = "default_true")]
    pub token_purge_enabled: bool,

    /// Six-field cron expression (with seconds)
    #[serde(default = "default_token_purge_schedule")]
    pub token_purge_schedule: String,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            token_purge_enabled: true,
            token_purge_schedule: default_token_purge_schedule(),
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    /// Whether console output is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to use colored output
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Whether file output is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Path to the log file
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime LoggerConfig
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let format = self
            .file
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.file.format".to_string(), e.to_string()))?;

        let console = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file = FileConfig {
            enabled: self.file.enabled,
            path: PathBuf::from(self.file.path),
            append: self.file.append,
            format,
        };

        LoggerConfig::new(console, file, self.level)
            .map_err(|e| ConfigError::validation("logger".to_string(), e.to_string()))
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
///
/// This structure represents the entire configuration that can be loaded
/// from TOML files and environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub jobs: JobsConfig,

    #[serde(default)]
    pub logger: LoggerSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_lifetimes() {
        let settings = Settings::default();
        assert_eq!(settings.auth.activation_ttl(), Duration::from_secs(72 * 3600));
        assert_eq!(settings.auth.authentication_ttl(), Duration::from_secs(24 * 3600));
        assert_eq!(settings.database.statement_timeout(), Duration::from_secs(3));
        assert_eq!(settings.database.backend, StorageBackend::Postgres);
        assert_eq!(settings.notifications.sender, SenderKind::Log);
    }

    #[test]
    fn test_ttl_conversion_never_overflows() {
        let auth = AuthConfig {
            activation_token_ttl_hours: i64::MAX,
            authentication_token_ttl_hours: -5,
            ..AuthConfig::default()
        };
        assert_eq!(auth.activation_ttl(), Duration::from_secs(u64::MAX));
        assert_eq!(auth.authentication_ttl(), Duration::ZERO);
    }

    #[test]
    fn test_server_address() {
        let server = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 9000,
            ..ServerConfig::default()
        };
        assert_eq!(server.address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_backend_deserializes_lowercase() {
        let settings: Settings = toml_from_str(
            r#"
            [database]
            backend = "memory"

            [notifications]
            sender = "smtp"
            "#,
        );
        assert_eq!(settings.database.backend, StorageBackend::Memory);
        assert_eq!(settings.notifications.sender, SenderKind::Smtp);
    }

    #[test]
    fn test_logger_settings_into_logger_config() {
        let mut logger = LoggerSettings::default();
        logger.file.format = "compact".to_string();
        let config = logger.into_logger_config().expect("valid logger settings");
        assert_eq!(config.file.format, LogFormat::Compact);
        assert!(config.console.enabled);
    }

    #[test]
    fn test_logger_settings_rejects_unknown_format() {
        let mut logger = LoggerSettings::default();
        logger.file.format = "xml".to_string();
        assert!(logger.into_logger_config().is_err());
    }

    fn toml_from_str(source: &str) -> Settings {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .expect("config should build")
            .try_deserialize()
            .expect("settings should deserialize")
    }
}
