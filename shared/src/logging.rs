//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::RuntimeMode;

/// Filter applied when `RUST_LOG` is unset.
pub fn default_directive(runtime: RuntimeMode) -> &'static str {
    match runtime {
        RuntimeMode::Production => "info",
        RuntimeMode::Development => "debug",
    }
}

/// Install the global subscriber.
///
/// Production writes JSON lines for the platform's log drain; development
/// writes plain text. `RUST_LOG` overrides the level in both modes.
pub fn init(runtime: RuntimeMode) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(runtime)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    // A second init (e.g. warm reuse in tests) keeps the first subscriber.
    let _ = match runtime {
        RuntimeMode::Production => builder.json().try_init(),
        RuntimeMode::Development => builder.with_target(false).try_init(),
    };
}
