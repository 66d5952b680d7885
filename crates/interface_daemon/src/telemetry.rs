//! Structured logging setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::DaemonConfig;
use crate::error::DaemonError;

/// Installs the global subscriber
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: &DaemonConfig) -> Result<(), DaemonError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };
    installed.map_err(|e| DaemonError::Telemetry(e.to_string()))
}
