// Logging setup.
// Installs a tracing subscriber filtered by RUST_LOG, with optional JSON output.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Set to `json` for machine-readable log lines.
pub const LOG_FORMAT_ENV_VAR: &str = "OFFLINE_SHELL_LOG_FORMAT";

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize logging once per process. Later calls are no-ops.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let json = std::env::var(LOG_FORMAT_ENV_VAR).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

        let registry = tracing_subscriber::registry().with(filter);
        let result = if json {
            registry
                .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
                .try_init()
        } else {
            registry
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .try_init()
        };

        // Embedding hosts may already own the global subscriber
        if result.is_err() {
            tracing::debug!("Global tracing subscriber already set");
        }
    });
}
