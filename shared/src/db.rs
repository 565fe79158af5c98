//! Database connection management.

use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::time::Duration;
use tracing::info;

use crate::config::{Persistence, SqliteConfig};
use crate::postgres::{PostgresConfig, SslMode};
use crate::Result;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

/// Pool for whichever backend the configuration selected.
#[derive(Debug, Clone)]
pub enum Database {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl Database {
    /// Create a pool that opens its first connection on first use.
    ///
    /// Connection failures (DNS, auth, TLS) therefore surface from the first
    /// query, never from startup.
    pub fn connect_lazy(persistence: &Persistence) -> Self {
        match persistence {
            Persistence::Postgres(config) => {
                info!(target_url = %config.redacted_url(), "Creating lazy PostgreSQL pool");
                Database::Postgres(
                    PgPoolOptions::new()
                        .max_connections(MAX_CONNECTIONS)
                        .acquire_timeout(ACQUIRE_TIMEOUT)
                        .connect_lazy_with(pg_options(config)),
                )
            }
            Persistence::Sqlite(config) => {
                info!(path = %config.path.display(), "Creating lazy SQLite pool");
                Database::Sqlite(
                    SqlitePoolOptions::new()
                        .max_connections(MAX_CONNECTIONS)
                        .acquire_timeout(ACQUIRE_TIMEOUT)
                        .connect_lazy_with(sqlite_options(config)),
                )
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Database::Postgres(_) => "postgres",
            Database::Sqlite(_) => "sqlite",
        }
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<()> {
        match self {
            Database::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            Database::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
        }
        Ok(())
    }
}

fn pg_options(config: &PostgresConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(config.host())
        .port(config.port())
        .database(config.database())
        .username(config.user())
        .password(config.password().expose_secret())
        .ssl_mode(pg_ssl_mode(config.ssl_mode()))
}

fn pg_ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Allow => PgSslMode::Allow,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
        SslMode::VerifyCa => PgSslMode::VerifyCa,
        SslMode::VerifyFull => PgSslMode::VerifyFull,
    }
}

fn sqlite_options(config: &SqliteConfig) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_mode_mapping() {
        assert!(matches!(pg_ssl_mode(SslMode::Require), PgSslMode::Require));
        assert!(matches!(pg_ssl_mode(SslMode::VerifyFull), PgSslMode::VerifyFull));
        assert!(matches!(pg_ssl_mode(SslMode::Disable), PgSslMode::Disable));
    }

    #[tokio::test]
    async fn test_lazy_pool_does_not_connect() {
        // Port 1 on an unroutable test address: any eager connect would fail.
        let config = PostgresConfig::from_url(
            "postgresql://u:p@192.0.2.1:1/spotwego?sslmode=require",
        )
        .unwrap();
        let db = Database::connect_lazy(&Persistence::Postgres(config));
        assert_eq!(db.kind(), "postgres");
        if let Database::Postgres(pool) = &db {
            assert_eq!(pool.size(), 0);
        }
    }

    #[tokio::test]
    async fn test_sqlite_ping_creates_file() {
        let path = std::env::temp_dir().join(format!("spotwego-ping-{}.db", std::process::id()));
        let db = Database::connect_lazy(&Persistence::Sqlite(SqliteConfig { path: path.clone() }));
        assert_eq!(db.kind(), "sqlite");
        db.ping().await.unwrap();
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }
}
