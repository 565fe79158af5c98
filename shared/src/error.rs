//! Error types for Spotwego functions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Spotwego functions.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigurationError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Database(_) => 503,
            _ => 500,
        }
    }
}

/// Startup configuration failures.
///
/// These are fatal: a function that fails to resolve its configuration must
/// not start serving.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// PostgreSQL mode was requested without a usable `DATABASE_URL` and with
    /// an incomplete set of `DB_*` variables.
    #[error(
        "USE_POSTGRES is true but DATABASE_URL is not set and the DB_* variables are incomplete; missing: {}",
        .missing.join(", ")
    )]
    MissingVariables { missing: Vec<&'static str> },

    /// `DATABASE_URL` could not be parsed into a complete connection target.
    #[error("DATABASE_URL is malformed: {reason}")]
    InvalidDatabaseUrl { reason: String },

    /// A variable is set but its value is unusable.
    #[error("{variable} has invalid value {value:?}: {reason}")]
    InvalidValue {
        variable: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigurationError {
    pub(crate) fn url(reason: impl Into<String>) -> Self {
        ConfigurationError::InvalidDatabaseUrl {
            reason: reason.into(),
        }
    }

    /// Names of the environment variables this error is about.
    pub fn variables(&self) -> Vec<&'static str> {
        match self {
            ConfigurationError::MissingVariables { missing } => missing.clone(),
            ConfigurationError::InvalidDatabaseUrl { .. } => vec!["DATABASE_URL"],
            ConfigurationError::InvalidValue { variable, .. } => vec![*variable],
        }
    }
}
