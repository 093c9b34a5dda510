//! Unit tests for the refresh scheduler

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use stockwatch::config::AppConfig;
use stockwatch::core::runtime::MonitorRuntime;
use stockwatch::core::scheduler::{interval_to_cron, Cadence, RefreshScheduler};
use stockwatch::error::FetchError;
use stockwatch::models::Quote;
use stockwatch::services::quote_source::QuoteSource;
use tokio::sync::RwLock;

struct NoQuotes;

#[async_trait::async_trait]
impl QuoteSource for NoQuotes {
    async fn fetch(&self, _symbol: &str) -> Result<Quote, FetchError> {
        Err(FetchError::Status(503))
    }
}

fn runtime() -> Arc<MonitorRuntime> {
    Arc::new(MonitorRuntime::new(
        Arc::new(RwLock::new(AppConfig::default())),
        Arc::new(NoQuotes),
    ))
}

/// Seconds between the first few ticks after an arbitrary off-boundary instant.
fn tick_gaps(interval: u64) -> Vec<i64> {
    let cadence = Cadence::new(interval).expect("schedulable interval");
    let start = Utc.with_ymd_and_hms(2024, 3, 5, 13, 7, 11).unwrap();
    let ticks: Vec<_> = cadence.schedule().after(&start).take(5).collect();
    ticks.windows(2).map(|w| (w[1] - w[0]).num_seconds()).collect()
}

#[test]
fn test_interval_to_cron() {
    assert_eq!(interval_to_cron(30).as_deref(), Some("*/30 * * * * *"));
    assert_eq!(interval_to_cron(60).as_deref(), Some("0 */1 * * * *"));
    assert_eq!(interval_to_cron(120).as_deref(), Some("0 */2 * * * *"));
    assert_eq!(interval_to_cron(300).as_deref(), Some("0 */5 * * * *"));
    assert_eq!(interval_to_cron(7200).as_deref(), Some("0 0 */2 * * *"));
}

#[test]
fn test_uneven_intervals_have_no_cron_form() {
    assert_eq!(interval_to_cron(0), None);
    assert_eq!(interval_to_cron(45), None);
    assert_eq!(interval_to_cron(90), None);
    assert_eq!(interval_to_cron(5400), None);
    assert_eq!(interval_to_cron(18000), None);
}

#[test]
fn test_ticks_are_evenly_spaced() {
    for interval in [30, 60, 120, 300, 7200] {
        assert_eq!(tick_gaps(interval), vec![interval as i64; 4], "interval {}", interval);
    }
}

#[test]
fn test_unschedulable_intervals_are_rejected() {
    for interval in [0, 45, 90] {
        assert!(
            RefreshScheduler::new(runtime(), interval).is_err(),
            "interval {}",
            interval
        );
    }
}

#[test]
fn test_cadence_follows_config_changes() {
    let mut cadence = Cadence::new(60).expect("valid");
    assert!(!cadence.sync(60));

    assert!(cadence.sync(120));
    assert_eq!(cadence.interval_seconds(), 120);

    // an interval cron cannot space evenly keeps the current one
    assert!(!cadence.sync(45));
    assert_eq!(cadence.interval_seconds(), 120);
}

#[tokio::test]
async fn test_start_and_stop() {
    let scheduler = RefreshScheduler::new(runtime(), 60).expect("valid interval");
    assert!(!scheduler.is_running().await);
    scheduler.start().await;
    assert!(scheduler.is_running().await);
    scheduler.stop().await;
    assert!(!scheduler.is_running().await);
}
