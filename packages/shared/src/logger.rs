//! Logging setup for the Hubbub binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Both the library crates (`hubbub_server`, `hubbub_shared`), `tower_http`
/// and the binary target get `default_log_level` unless `RUST_LOG` overrides it.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary target (e.g., "hubbub_server")
/// * `default_log_level` - The default log level (e.g., "debug", "info")
///
/// # Examples
///
/// ```no_run
/// use hubbub_shared::logger::setup_logger;
///
/// setup_logger("hubbub_server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_directives(binary_name: &str, level: &str) -> String {
    format!(
        "hubbub_server={level},{shared}={level},tower_http={level},{bin}={level}",
        shared = env!("CARGO_PKG_NAME").replace('-', "_"),
        bin = binary_name.replace('-', "_"),
    )
}
