//! Dashboard Lambda - Serverless entry point for the Spotwego dashboard.
//!
//! Configuration is resolved once per cold start. An invalid configuration
//! stops the process before the runtime starts accepting requests.

use chrono::{DateTime, Utc};
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Serialize;
use shared::{
    error_response, json_response, logging, ApiResponse, Config, ConnectionSource, Database, EnvSnapshot,
    RuntimeMode, SslMode,
};
use std::sync::Arc;
use tracing::{error, info};

/// Connection target, shown only in development.
#[derive(Debug, Serialize)]
struct ConnectionSummary {
    host: String,
    port: u16,
    database: String,
    ssl_mode: SslMode,
    source: ConnectionSource,
}

/// Status report response
#[derive(Debug, Serialize)]
struct StatusReport {
    status: &'static str,
    runtime_mode: RuntimeMode,
    persistence: &'static str,
    checked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    connection: Option<ConnectionSummary>,
}

/// Application state
struct AppState {
    config: Config,
    db: Database,
}

impl AppState {
    fn new(config: Config) -> Self {
        let db = Database::connect_lazy(&config.persistence);
        Self { config, db }
    }
}

fn status_report(config: &Config) -> StatusReport {
    let connection = match config.runtime {
        RuntimeMode::Production => None,
        RuntimeMode::Development => config.persistence.postgres().map(|pg| ConnectionSummary {
            host: pg.host().to_string(),
            port: pg.port(),
            database: pg.database().to_string(),
            ssl_mode: pg.ssl_mode(),
            source: pg.source(),
        }),
    };

    StatusReport {
        status: "ok",
        runtime_mode: config.runtime,
        persistence: config.persistence.kind(),
        checked_at: Utc::now(),
        connection,
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    info!(method = %event.method(), path = event.uri().path(), "Received request");

    if let Err(e) = state.db.ping().await {
        return error_response(state.config.runtime, &e);
    }

    json_response(200, &ApiResponse::success(status_report(&state.config)))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let env = EnvSnapshot::capture();
    let runtime = RuntimeMode::resolve(&env);
    logging::init(runtime);

    let config = Config::resolve(&env).map_err(|e| {
        error!(error = %e, variables = ?e.variables(), "Refusing to start: invalid configuration");
        e
    })?;
    info!(
        runtime = runtime.as_str(),
        persistence = config.persistence.kind(),
        "Configuration resolved"
    );

    let state = Arc::new(AppState::new(config));

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
