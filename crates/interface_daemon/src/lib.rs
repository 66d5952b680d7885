//! Protection Hub Daemon
//!
//! Loads configuration, sets up logging and runs the workflow's daily
//! maintenance jobs until the process is asked to stop.
//!
//! # Modules
//!
//! - `config`: File and `HUB_*` environment configuration
//! - `telemetry`: `tracing` subscriber setup
//! - `hub`: Store, cache and job wiring
//! - `error`: Startup errors

pub mod config;
pub mod error;
pub mod hub;
pub mod telemetry;

pub use crate::config::DaemonConfig;
pub use crate::error::DaemonError;
pub use crate::hub::Hub;
pub use crate::telemetry::init_tracing;
