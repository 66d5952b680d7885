//! Daemon configuration
//!
//! Values come from an optional `protection-hub.{toml,yaml,json}` file and
//! are overridden by `HUB_*` environment variables. Nested workflow
//! settings use a double underscore:
//!
//! ```bash
//! HUB_LOG_LEVEL=debug
//! HUB_LOG_JSON=true
//! HUB_WORKFLOW__REFUND_WINDOW_DAYS=14
//! HUB_WORKFLOW__PAYMENT_EXPIRY_AT=03:30:00
//! ```

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use app_workflow::WorkflowConfig;
use core_kernel::CoreError;

use crate::error::DaemonError;

/// Prefix of the environment overrides
pub const ENV_PREFIX: &str = "HUB";

/// Names the configuration file to load instead of the default
pub const CONFIG_FILE_VAR: &str = "HUB_CONFIG_FILE";

/// Configuration file looked up when `HUB_CONFIG_FILE` is unset
pub const DEFAULT_CONFIG_FILE: &str = "protection-hub";

/// Daemon configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Log filter, e.g. `info` or `app_workflow=debug,info`
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
    /// Coordinator and job settings
    pub workflow: WorkflowConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            workflow: WorkflowConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Loads configuration from the config file and environment
    pub fn from_env() -> Result<Self, DaemonError> {
        let file = std::env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let builder = Config::builder()
            .add_source(File::with_name(&file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::from_builder(builder)
    }

    /// Builds and validates configuration from prepared sources
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, DaemonError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DaemonError> {
        if self.log_level.trim().is_empty() {
            return Err(CoreError::configuration("log_level must not be empty").into());
        }
        self.workflow.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults() {
        let config = DaemonConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert_eq!(config.workflow, WorkflowConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_sources_give_defaults() {
        let config = DaemonConfig::from_builder(Config::builder()).unwrap();
        assert_eq!(config.workflow.refund_window_days, 30);
    }

    #[test]
    fn test_blank_log_level_rejected() {
        let source = File::from_str("log_level = \" \"", FileFormat::Toml);
        let result = DaemonConfig::from_builder(Config::builder().add_source(source));
        assert!(matches!(result, Err(DaemonError::Invalid(_))));
    }
}
