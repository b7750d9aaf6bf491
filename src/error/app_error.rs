use crate::error::DatabaseErrorConverter;
use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

impl ValidationFieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-wide error type that represents all possible errors in the system.
///
/// Authentication failures are deliberately coarse: `InvalidCredentials` never
/// says whether the account exists and `TokenInvalid` never says whether the
/// token was unknown, expired or issued for another scope.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Duplicate entry error for unique constraint violations
    #[error("Duplicate entry: {entity}.{field} = '{value}' already exists")]
    Duplicate {
        entity: String,
        field: String,
        value: String,
    },

    /// Single-field validation error
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Request body failed schema validation
    #[error("Validation failed for {} field(s)", errors.len())]
    ValidationErrors { errors: Vec<ValidationFieldError> },

    /// Bad request error with descriptive message
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Authorization header present but not of the form `Bearer <token>`
    #[error("Malformed authorization header")]
    MalformedCredential,

    /// Login rejected; covers both unknown account and wrong password
    #[error("Invalid authentication credentials")]
    InvalidCredentials,

    /// Presented token is unknown, expired or of another scope
    #[error("Invalid or expired token")]
    TokenInvalid,

    /// Bearer token could not be resolved, or the route needs a signed-in principal
    #[error("Invalid or missing authentication token")]
    Unauthenticated,

    /// Route requires an activated account
    #[error("Account must be activated to access this resource")]
    InactiveAccount,

    /// Optimistic version check failed
    #[error("Edit conflict on {entity} {id}")]
    Conflict { entity: String, id: String },

    /// Database operation error with operation context
    #[error("Database operation failed: {operation}")]
    Database {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// A store call exceeded its deadline
    #[error("Operation timed out: {operation}")]
    Timeout { operation: String },

    /// Connection pool error
    #[error("Connection pool error")]
    ConnectionPool {
        #[source]
        source: anyhow::Error,
    },

    /// Hashing a new credential failed
    #[error("Password hashing failed")]
    PasswordHash {
        #[source]
        source: anyhow::Error,
    },

    /// A stored credential could not be parsed
    #[error("Stored credential is corrupt")]
    CorruptCredential {
        #[source]
        source: anyhow::Error,
    },

    /// An outgoing notification could not be delivered
    #[error("Notification delivery failed via {provider}")]
    Notification {
        provider: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// True for a unique violation on the given user field (`name` or `email`).
    pub fn is_duplicate(&self, column: &str) -> bool {
        matches!(self, AppError::Duplicate { field, .. } if field == column)
    }

    pub fn duplicate_user(field: &str, value: &str) -> Self {
        AppError::Duplicate {
            entity: "users".to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(error: diesel::result::Error) -> Self {
        DatabaseErrorConverter::convert_diesel_error(error, "database operation")
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for AppError {
    fn from(error: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        AppError::ConnectionPool {
            source: anyhow::Error::msg(error.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<ValidationFieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is not valid", field));
                    ValidationFieldError::new(field.to_string(), message)
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::ValidationErrors { errors: fields }
    }
}

impl From<crate::config::error::ConfigError> for AppError {
    fn from(error: crate::config::error::ConfigError) -> Self {
        AppError::Configuration {
            key: error.key().to_string(),
            source: anyhow::Error::from(error),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
