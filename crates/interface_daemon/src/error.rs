//! Daemon errors

use thiserror::Error;

use core_kernel::CoreError;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] CoreError),

    #[error("Failed to initialise logging: {0}")]
    Telemetry(String),
}
