//! PostgreSQL connection settings and their two environment encodings.
//!
//! A deployment either provides one `DATABASE_URL` or the individual
//! `DB_HOST`/`DB_NAME`/`DB_USER`/`DB_PASSWORD` fields (plus optional `DB_PORT`).
//! Both forms produce the same validated [`PostgresConfig`].

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::fmt;
use url::{Host, Url};

use crate::config::RuntimeMode;
use crate::env::EnvSnapshot;
use crate::error::ConfigurationError;

/// Default PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const DB_HOST: &str = "DB_HOST";
pub const DB_NAME: &str = "DB_NAME";
pub const DB_USER: &str = "DB_USER";
pub const DB_PASSWORD: &str = "DB_PASSWORD";
pub const DB_PORT: &str = "DB_PORT";

/// Variables required for the field form, in reporting order.
pub const REQUIRED_FIELDS: [&str; 4] = [DB_HOST, DB_NAME, DB_USER, DB_PASSWORD];

/// libpq `sslmode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    Disable,
    Allow,
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    /// Parse an `sslmode` query value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "disable" => Some(SslMode::Disable),
            "allow" => Some(SslMode::Allow),
            "prefer" => Some(SslMode::Prefer),
            "require" => Some(SslMode::Require),
            "verify-ca" => Some(SslMode::VerifyCa),
            "verify-full" => Some(SslMode::VerifyFull),
            _ => None,
        }
    }

    /// Mode for the `DB_*` form, which has no way to state one.
    pub fn inferred(runtime: RuntimeMode) -> Self {
        match runtime {
            RuntimeMode::Production => SslMode::Require,
            RuntimeMode::Development => SslMode::Prefer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Allow => "allow",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        }
    }

    /// Whether a connection must not fall back to plaintext.
    pub fn is_required(&self) -> bool {
        matches!(self, SslMode::Require | SslMode::VerifyCa | SslMode::VerifyFull)
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which environment encoding a [`PostgresConfig`] was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionSource {
    Url,
    Fields,
}

/// Validated PostgreSQL connection target.
#[derive(Debug)]
pub struct PostgresConfig {
    host: String,
    port: u16,
    database: String,
    user: String,
    password: SecretString,
    ssl_mode: SslMode,
    source: ConnectionSource,
}

impl PostgresConfig {
    /// Parse a `postgres://` or `postgresql://` connection string.
    ///
    /// Host, port, database name, user, password and `sslmode` are all
    /// mandatory.
    pub fn from_url(raw: &str) -> Result<Self, ConfigurationError> {
        let url = Url::parse(raw.trim()).map_err(|e| ConfigurationError::url(e.to_string()))?;

        match url.scheme() {
            "postgres" | "postgresql" => {}
            other => {
                return Err(ConfigurationError::url(format!(
                    "unsupported scheme '{}', expected postgresql",
                    other
                )))
            }
        }

        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => return Err(ConfigurationError::url("missing host")),
        };

        let port = match url.port() {
            Some(0) => return Err(ConfigurationError::url("port must be between 1 and 65535")),
            Some(port) => port,
            None => return Err(ConfigurationError::url("missing port")),
        };

        let database = decode(url.path().trim_start_matches('/'), "database name")?;
        if database.is_empty() {
            return Err(ConfigurationError::url("missing database name"));
        }
        if database.contains('/') {
            return Err(ConfigurationError::url("database name must be a single path segment"));
        }

        let user = decode(url.username(), "user")?;
        if user.is_empty() {
            return Err(ConfigurationError::url("missing user"));
        }
        let password = match url.password() {
            Some(encoded) => decode(encoded, "password")?,
            None => return Err(ConfigurationError::url("missing password")),
        };
        if password.is_empty() {
            return Err(ConfigurationError::url("missing password"));
        }

        let ssl_mode = match url.query_pairs().find(|(key, _)| key == "sslmode") {
            Some((_, value)) => SslMode::parse(&value).ok_or_else(|| {
                ConfigurationError::url(format!("unknown sslmode '{}'", value))
            })?,
            None => return Err(ConfigurationError::url("missing sslmode")),
        };

        Ok(Self {
            host,
            port,
            database,
            user,
            password: SecretString::from(password),
            ssl_mode,
            source: ConnectionSource::Url,
        })
    }

    /// Assemble a config from the individual `DB_*` variables.
    ///
    /// Every missing required variable is reported at once.
    pub fn from_fields(env: &EnvSnapshot, runtime: RuntimeMode) -> Result<Self, ConfigurationError> {
        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|name| !env.is_set(name))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigurationError::MissingVariables { missing });
        }

        let port = match env.get(DB_PORT) {
            Some(raw) => parse_port(raw)?,
            None => DEFAULT_PORT,
        };

        // Presence was checked above.
        let field = |name: &str| env.get(name).unwrap_or_default().to_string();

        Ok(Self {
            host: field(DB_HOST),
            port,
            database: field(DB_NAME),
            user: field(DB_USER),
            password: SecretString::from(field(DB_PASSWORD)),
            ssl_mode: SslMode::inferred(runtime),
            source: ConnectionSource::Fields,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    pub fn ssl_mode(&self) -> SslMode {
        self.ssl_mode
    }

    pub fn ssl_required(&self) -> bool {
        self.ssl_mode.is_required()
    }

    pub fn source(&self) -> ConnectionSource {
        self.source
    }

    /// Connection string with the password masked, safe for logs.
    pub fn redacted_url(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!(
            "postgresql://{}:***@{}:{}/{}?sslmode={}",
            urlencoding::encode(&self.user),
            host,
            self.port,
            urlencoding::encode(&self.database),
            self.ssl_mode
        )
    }
}

impl Clone for PostgresConfig {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            user: self.user.clone(),
            password: SecretString::from(self.password.expose_secret().to_owned()),
            ssl_mode: self.ssl_mode,
            source: self.source,
        }
    }
}

impl PartialEq for PostgresConfig {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host
            && self.port == other.port
            && self.database == other.database
            && self.user == other.user
            && self.password.expose_secret() == other.password.expose_secret()
            && self.ssl_mode == other.ssl_mode
            && self.source == other.source
    }
}

impl Eq for PostgresConfig {}

fn decode(raw: &str, what: &str) -> Result<String, ConfigurationError> {
    urlencoding::decode(raw)
        .map(|value| value.into_owned())
        .map_err(|_| ConfigurationError::url(format!("{} is not valid UTF-8 after percent-decoding", what)))
}

fn parse_port(raw: &str) -> Result<u16, ConfigurationError> {
    let invalid = |reason: &str| ConfigurationError::InvalidValue {
        variable: DB_PORT,
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    match raw.trim().parse::<u16>() {
        Ok(0) => Err(invalid("port must be between 1 and 65535")),
        Ok(port) => Ok(port),
        Err(_) => Err(invalid("expected an integer port")),
    }
}
