//! Shared library for Spotwego serverless functions.
//!
//! Provides cold-start configuration resolution, database pools, logging setup
//! and HTTP response helpers used by every function.

pub mod config;
pub mod db;
pub mod env;
pub mod error;
pub mod http;
pub mod logging;
pub mod postgres;

pub use config::{Config, Persistence, RuntimeMode, SqliteConfig};
pub use db::Database;
pub use env::EnvSnapshot;
pub use error::{ConfigurationError, Error, Result};
pub use http::{error_response, json_response, ApiResponse};
pub use postgres::{ConnectionSource, PostgresConfig, SslMode};
