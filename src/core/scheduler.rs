//! Cron-based scheduler driving periodic refresh cycles

use crate::core::runtime::MonitorRuntime;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Convert an interval in seconds to a cron expression (second minute hour day month weekday).
///
/// `None` when cron cannot fire at evenly spaced ticks of that length, e.g. 45s or 90s.
pub fn interval_to_cron(interval_seconds: u64) -> Option<String> {
    match interval_seconds {
        0 => None,
        s if s < 60 => (60 % s == 0).then(|| format!("*/{} * * * * *", s)),
        s if s < 3600 => {
            let minutes = s / 60;
            (s % 60 == 0 && 60 % minutes == 0).then(|| format!("0 */{} * * * *", minutes))
        }
        s => {
            let hours = s / 3600;
            (s % 3600 == 0 && 24 % hours == 0).then(|| format!("0 0 */{} * * *", hours))
        }
    }
}

/// A refresh interval together with the cron schedule that realizes it.
#[derive(Debug, Clone)]
pub struct Cadence {
    interval_seconds: u64,
    schedule: Schedule,
}

impl Cadence {
    pub fn new(interval_seconds: u64) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let cron_expr = interval_to_cron(interval_seconds).ok_or_else(|| {
            format!(
                "Refresh interval {}s cannot be scheduled at even ticks",
                interval_seconds
            )
        })?;
        let schedule = Schedule::from_str(&cron_expr).map_err(|e| {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid cron expression '{}': {}", cron_expr, e),
            )) as Box<dyn std::error::Error + Send + Sync>
        })?;
        Ok(Self {
            interval_seconds,
            schedule,
        })
    }

    pub fn interval_seconds(&self) -> u64 {
        self.interval_seconds
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Switch to `interval_seconds` if it differs and can be scheduled. Returns whether it switched.
    pub fn sync(&mut self, interval_seconds: u64) -> bool {
        if interval_seconds == self.interval_seconds {
            return false;
        }
        match Cadence::new(interval_seconds) {
            Ok(next) => {
                info!(
                    from = self.interval_seconds,
                    to = interval_seconds,
                    "RefreshScheduler: refresh interval changed"
                );
                *self = next;
                true
            }
            Err(e) => {
                warn!(interval = interval_seconds, error = %e, "RefreshScheduler: keeping previous interval");
                false
            }
        }
    }
}

/// Scheduler that periodically runs a refresh cycle on the monitor runtime
pub struct RefreshScheduler {
    runtime: Arc<MonitorRuntime>,
    cadence: Cadence,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl RefreshScheduler {
    /// Create a new scheduler
    ///
    /// # Arguments
    /// * `runtime` - Runtime whose `run_cycle` is invoked on each tick
    /// * `interval_seconds` - Initial refresh interval; later changes to the runtime's
    ///   config are picked up before the next tick
    pub fn new(
        runtime: Arc<MonitorRuntime>,
        interval_seconds: u64,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        if interval_seconds == 0 {
            return Err("Scheduler disabled: interval_seconds is 0".into());
        }
        let cadence = Cadence::new(interval_seconds)?;

        info!(
            interval = interval_seconds,
            "RefreshScheduler: created with interval {}s",
            interval_seconds
        );

        Ok(Self {
            runtime,
            cadence,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    /// Start the scheduler
    pub async fn start(&self) {
        let runtime = self.runtime.clone();
        let mut cadence = self.cadence.clone();

        let handle = tokio::spawn(async move {
            info!("RefreshScheduler: started, waiting for cron schedule...");

            loop {
                let configured = runtime.config().read().await.refresh_interval;
                cadence.sync(configured);

                let mut upcoming = cadence.schedule().upcoming(chrono::Utc);
                if let Some(next_tick) = upcoming.next() {
                    let now = chrono::Utc::now();
                    if next_tick > now {
                        let duration = (next_tick - now).to_std().unwrap_or_default();
                        tokio::time::sleep(duration).await;
                    }
                } else {
                    tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
                    continue;
                }

                let report = runtime.run_cycle().await;
                debug!(
                    cycle_id = report.cycle_id,
                    alert_count = report.alerts.len(),
                    "RefreshScheduler: cycle complete"
                );
            }
        });

        let mut h = self.handle.write().await;
        if let Some(previous) = h.replace(handle) {
            previous.abort();
        }
        info!("RefreshScheduler: started successfully");
    }

    /// Stop the scheduler
    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("RefreshScheduler: stopped");
        }
    }

    /// Check if the scheduler is running
    pub async fn is_running(&self) -> bool {
        let handle = self.handle.read().await;
        handle.is_some()
    }
}
