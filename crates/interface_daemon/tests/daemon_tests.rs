//! Daemon configuration and wiring tests

use chrono::NaiveTime;
use config::{Config, File, FileFormat};
use rust_decimal_macros::dec;
use std::sync::Arc;

use core_kernel::{AdapterHealth, FixedClock};
use domain_billing::PaymentStatus;
use interface_daemon::{DaemonConfig, DaemonError, Hub};
use test_utils::*;

fn hub() -> (Hub, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(TemporalFixtures::now()));
    (Hub::new(DaemonConfig::default(), clock.clone()), clock)
}

// ============================================================================
// Configuration Tests
// ============================================================================

mod config_tests {
    use super::*;

    #[test]
    fn test_file_values_override_defaults() {
        let toml = r#"
            log_level = "debug"
            log_json = true

            [workflow]
            refund_window_days = 14
            amount_tolerance = "0.02"
            payment_expiry_at = "03:30:00"
        "#;
        let config =
            DaemonConfig::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
                .unwrap();

        assert_eq!(config.log_level, "debug");
        assert!(config.log_json);
        assert_eq!(config.workflow.refund_window_days, 14);
        assert_eq!(config.workflow.amount_tolerance, dec!(0.02));
        assert_eq!(
            config.workflow.payment_expiry_at,
            NaiveTime::from_hms_opt(3, 30, 0).unwrap()
        );
        assert_eq!(config.workflow.pending_expiry_hours, 24);
    }

    #[test]
    fn test_invalid_workflow_settings_rejected() {
        let toml = r#"
            [workflow]
            amount_tolerance = "1.5"
        "#;
        let result =
            DaemonConfig::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)));
        assert!(matches!(result, Err(DaemonError::Invalid(_))));
    }

    #[test]
    fn test_malformed_value_is_a_load_error() {
        let toml = r#"
            [workflow]
            refund_window_days = "soon"
        "#;
        let result =
            DaemonConfig::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)));
        assert!(matches!(result, Err(DaemonError::Config(_))));
    }
}

// ============================================================================
// Hub Wiring Tests
// ============================================================================

mod hub_tests {
    use super::*;

    #[tokio::test]
    async fn test_store_reports_healthy() {
        let (hub, _) = hub();
        let health = hub.health().await;
        assert_eq!(health.status, AdapterHealth::Healthy);
    }

    #[tokio::test]
    async fn test_both_jobs_scheduled() {
        let (hub, _) = hub();
        let scheduler = hub.scheduler();
        let names: Vec<_> = scheduler.runners().map(|r| r.name()).collect();
        assert_eq!(names, vec!["pending-payment-expiry", "overdue-repair-orders"]);
    }

    #[tokio::test]
    async fn test_scheduled_expiry_job_closes_stale_payments() {
        let (hub, _) = hub();
        let workflow = hub.workflow();
        let plan = workflow
            .plans()
            .create(TestPlanRequestBuilder::new().build())
            .await
            .unwrap()
            .into_inner();
        let stale = workflow
            .payments()
            .create(
                TestPaymentRequestBuilder::new(plan.id)
                    .paid_at(TemporalFixtures::hours_ago(30))
                    .build(),
            )
            .await
            .unwrap()
            .into_inner();

        let scheduler = hub.scheduler();
        let expiry = scheduler
            .runners()
            .find(|r| r.name() == "pending-payment-expiry")
            .unwrap();
        let report = expiry.trigger().await.unwrap();
        assert_eq!(report.processed, 1);

        let stored = workflow.payments().get(stale.id).await.unwrap();
        assert_eq!(stored.record.status, PaymentStatus::Expired);
    }

    #[tokio::test]
    async fn test_run_returns_after_shutdown() {
        let (hub, _) = hub();
        hub.run(async {}).await;
    }
}
