//! Protection Hub - Daemon Binary
//!
//! Starts the workflow engine and its maintenance jobs.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin protection-hub
//!
//! # Override settings from the environment
//! HUB_LOG_JSON=true HUB_WORKFLOW__PENDING_EXPIRY_HOURS=48 cargo run --bin protection-hub
//! ```
//!
//! # Environment Variables
//!
//! * `HUB_CONFIG_FILE` - Configuration file to load (default: protection-hub.*)
//! * `HUB_LOG_LEVEL` - Log filter (default: info); `RUST_LOG` takes precedence
//! * `HUB_LOG_JSON` - Emit JSON logs (default: false)
//! * `HUB_WORKFLOW__*` - Any workflow setting, e.g. `HUB_WORKFLOW__REFUND_WINDOW_DAYS`

use anyhow::Context;
use std::sync::Arc;

use core_kernel::SystemClock;
use interface_daemon::{init_tracing, DaemonConfig, Hub};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = DaemonConfig::from_env().context("loading configuration")?;
    init_tracing(&config).context("initialising logging")?;

    tracing::info!(
        payment_expiry_at = %config.workflow.payment_expiry_at,
        overdue_repairs_at = %config.workflow.overdue_repairs_at,
        refund_window_days = config.workflow.refund_window_days,
        "Starting protection hub"
    );

    let hub = Hub::new(config, Arc::new(SystemClock));
    let health = hub.health().await;
    tracing::info!(
        adapter = %health.adapter_id,
        status = ?health.status,
        details = health.message.as_deref().unwrap_or_default(),
        "Store ready"
    );

    hub.run(shutdown_signal()).await;

    tracing::info!("Protection hub shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
