//! Configuration management for Spotwego functions.
//!
//! Everything a function needs from its environment is resolved exactly once,
//! at cold start, into a [`Config`]. Handlers receive that value instead of
//! reading environment variables themselves.

use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::env::EnvSnapshot;
use crate::error::ConfigurationError;
use crate::postgres::{PostgresConfig, DATABASE_URL, DB_HOST, DB_NAME, DB_PASSWORD, DB_PORT, DB_USER, REQUIRED_FIELDS};

pub const USE_POSTGRES: &str = "USE_POSTGRES";
pub const FLASK_ENV: &str = "FLASK_ENV";
pub const SQLITE_PATH: &str = "SQLITE_PATH";

/// Database file used when PostgreSQL is not enabled.
pub const DEFAULT_SQLITE_PATH: &str = "spotwego.db";

/// Production/development switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeMode {
    Production,
    Development,
}

impl RuntimeMode {
    /// Read `FLASK_ENV`. Only `production` selects production mode.
    pub fn resolve(env: &EnvSnapshot) -> Self {
        match env.get(FLASK_ENV) {
            Some(value) if value.trim().eq_ignore_ascii_case("production") => RuntimeMode::Production,
            _ => RuntimeMode::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, RuntimeMode::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeMode::Production => "production",
            RuntimeMode::Development => "development",
        }
    }
}

/// Local SQLite store used when `USE_POSTGRES` is not enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    pub path: PathBuf,
}

/// Where application data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    Postgres(PostgresConfig),
    Sqlite(SqliteConfig),
}

impl Persistence {
    pub fn kind(&self) -> &'static str {
        match self {
            Persistence::Postgres(_) => "postgres",
            Persistence::Sqlite(_) => "sqlite",
        }
    }

    pub fn postgres(&self) -> Option<&PostgresConfig> {
        match self {
            Persistence::Postgres(config) => Some(config),
            Persistence::Sqlite(_) => None,
        }
    }
}

/// Application configuration resolved from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Database connectivity
    pub persistence: Persistence,
    /// Production or development behaviour
    pub runtime: RuntimeMode,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::resolve(&EnvSnapshot::capture())
    }

    /// Resolve configuration from a captured environment.
    ///
    /// Pure: no environment writes, no network access. Resolving the same
    /// snapshot twice yields equal values.
    pub fn resolve(env: &EnvSnapshot) -> Result<Self, ConfigurationError> {
        env.require_utf8(&[USE_POSTGRES, FLASK_ENV])?;
        let runtime = RuntimeMode::resolve(env);

        let persistence = if postgres_enabled(env) {
            env.require_utf8(&[DATABASE_URL, DB_HOST, DB_NAME, DB_USER, DB_PASSWORD, DB_PORT])?;
            Persistence::Postgres(resolve_postgres(env, runtime)?)
        } else {
            env.require_utf8(&[SQLITE_PATH])?;
            let path = env.get(SQLITE_PATH).unwrap_or(DEFAULT_SQLITE_PATH);
            Persistence::Sqlite(SqliteConfig {
                path: PathBuf::from(path),
            })
        };

        Ok(Self {
            persistence,
            runtime,
        })
    }
}

fn postgres_enabled(env: &EnvSnapshot) -> bool {
    env.get(USE_POSTGRES)
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn resolve_postgres(env: &EnvSnapshot, runtime: RuntimeMode) -> Result<PostgresConfig, ConfigurationError> {
    match env.get(DATABASE_URL) {
        Some(url) => {
            let shadowed: Vec<&str> = REQUIRED_FIELDS
                .iter()
                .copied()
                .filter(|name| env.is_set(name))
                .collect();
            if !shadowed.is_empty() {
                warn!(
                    ignored = ?shadowed,
                    "DATABASE_URL is set; individual DB_* variables are ignored"
                );
            }
            let config = PostgresConfig::from_url(url)?;
            debug!(target_url = %config.redacted_url(), "Resolved PostgreSQL from DATABASE_URL");
            Ok(config)
        }
        None => {
            let config = PostgresConfig::from_fields(env, runtime)?;
            debug!(target_url = %config.redacted_url(), "Resolved PostgreSQL from DB_* variables");
            Ok(config)
        }
    }
}
