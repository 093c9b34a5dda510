//! One refresh cycle: fetch quotes, run the alert engine, relay fired alerts.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::alerts::engine::{AlertEngine, EngineState};
use crate::alerts::message::format_alert_message;
use crate::config::AppConfig;
use crate::core::clock::{Clock, SystemClock};
use crate::error::NotifyError;
use crate::metrics::Metrics;
use crate::models::alert::{AlertEvent, EvaluationResult};
use crate::models::quote::Quote;
use crate::services::notify::{self, DeliveryReport, DeliveryStatus, NotificationSink};
use crate::services::quote_source::QuoteSource;

/// Per-symbol line of a [`CycleReport`], in watchlist order.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<Quote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub result: EvaluationResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: u64,
    pub evaluated_at: DateTime<Utc>,
    pub outcomes: Vec<SymbolOutcome>,
    pub alerts: Vec<AlertEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub deliveries: Vec<DeliveryReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_error: Option<String>,
}

pub struct MonitorRuntime {
    config: Arc<RwLock<AppConfig>>,
    source: Arc<dyn QuoteSource>,
    sink_override: Option<Arc<dyn NotificationSink>>,
    http: reqwest::Client,
    clock: Arc<dyn Clock>,
    engine: AlertEngine,
    state: Mutex<EngineState>,
    last_report: RwLock<Option<CycleReport>>,
    cycles: AtomicU64,
    metrics: Option<Arc<Metrics>>,
}

impl MonitorRuntime {
    pub fn new(config: Arc<RwLock<AppConfig>>, source: Arc<dyn QuoteSource>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            config,
            source,
            sink_override: None,
            http: reqwest::Client::new(),
            engine: AlertEngine::new(clock.clone()),
            clock,
            state: Mutex::new(EngineState::new()),
            last_report: RwLock::new(None),
            cycles: AtomicU64::new(0),
            metrics: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.engine = AlertEngine::new(clock.clone());
        self.clock = clock;
        self
    }

    /// Use a fixed sink instead of building one from the WhatsApp config on each send.
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink_override = Some(sink);
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &Arc<RwLock<AppConfig>> {
        &self.config
    }

    pub fn source(&self) -> &Arc<dyn QuoteSource> {
        &self.source
    }

    /// The sink that would be used right now.
    pub async fn sink(&self) -> Arc<dyn NotificationSink> {
        match &self.sink_override {
            Some(sink) => sink.clone(),
            None => {
                let config = self.config.read().await;
                notify::from_config(&config.whatsapp, self.http.clone())
            }
        }
    }

    pub async fn last_report(&self) -> Option<CycleReport> {
        self.last_report.read().await.clone()
    }

    /// Stored prices for `symbol`, oldest first.
    pub async fn history(&self, symbol: &str) -> Option<Vec<f64>> {
        let state = self.state.lock().await;
        state.history(symbol).map(|h| h.to_vec())
    }

    /// Forget all price history and debounce timestamps.
    pub async fn reset(&self) {
        self.state.lock().await.reset();
        info!("MonitorRuntime: engine state reset");
    }

    pub async fn run_cycle(&self) -> CycleReport {
        let config = self.config.read().await.clone();
        let rules = config.stocks.rules().to_vec();
        let cycle_id = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;

        debug!(cycle_id = cycle_id, symbol_count = rules.len(), "MonitorRuntime: fetching quotes");

        let fetched = join_all(rules.iter().map(|rule| {
            let source = self.source.clone();
            async move { (rule.symbol.clone(), source.fetch(&rule.symbol).await) }
        }))
        .await;

        let mut quotes = HashMap::new();
        let mut errors = HashMap::new();
        for (symbol, result) in fetched {
            match result {
                Ok(quote) => {
                    quotes.insert(symbol, quote);
                }
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "MonitorRuntime: quote fetch failed");
                    if let Some(metrics) = &self.metrics {
                        metrics.quote_fetch_errors_total.inc();
                    }
                    errors.insert(symbol, e.to_string());
                }
            }
        }

        let results = {
            let mut state = self.state.lock().await;
            state.prune(&rules);
            self.engine.evaluate_all(&mut state, &quotes, &rules)
        };

        let alerts: Vec<AlertEvent> = results.iter().filter_map(|r| r.fired().cloned()).collect();
        if let Some(metrics) = &self.metrics {
            metrics.refresh_cycles_total.inc();
            metrics.watchlist_symbols.set(rules.len() as f64);
            metrics.alerts_fired_total.inc_by(alerts.len() as f64);
            let suppressed = results
                .iter()
                .filter(|r| matches!(r, EvaluationResult::Suppressed(_)))
                .count();
            metrics.alerts_suppressed_total.inc_by(suppressed as f64);
        }

        let outcomes = rules
            .iter()
            .zip(results)
            .map(|(rule, result)| SymbolOutcome {
                symbol: rule.symbol.clone(),
                display_name: rule.display_name.clone(),
                quote: quotes.remove(&rule.symbol),
                error: errors.remove(&rule.symbol),
                result,
            })
            .collect();

        let message = (!alerts.is_empty()).then(|| format_alert_message(&alerts));
        let mut report = CycleReport {
            cycle_id,
            evaluated_at: self.clock.now(),
            outcomes,
            alerts,
            message,
            deliveries: Vec::new(),
            delivery_error: None,
        };

        if !report.alerts.is_empty() {
            info!(
                cycle_id = cycle_id,
                alert_count = report.alerts.len(),
                "MonitorRuntime: {} alert(s) fired",
                report.alerts.len()
            );
            if config.whatsapp.auto_send {
                self.deliver_into(&mut report).await;
            }
        }

        *self.last_report.write().await = Some(report.clone());
        report
    }

    /// Send the alerts of the last cycle now. `None` when there is nothing pending.
    pub async fn send_pending(&self) -> Option<CycleReport> {
        let mut report = self
            .last_report
            .read()
            .await
            .clone()
            .filter(|r| !r.alerts.is_empty())?;
        self.deliver_into(&mut report).await;

        let mut guard = self.last_report.write().await;
        // a cycle that finished during delivery owns the slot now
        if guard.as_ref().map(|r| r.cycle_id) == Some(report.cycle_id) {
            *guard = Some(report.clone());
        }
        Some(report)
    }

    async fn deliver_into(&self, report: &mut CycleReport) {
        let Some(message) = report.message.clone() else {
            return;
        };
        let sink = self.sink().await;
        match sink.deliver(&report.alerts, &message).await {
            Ok(deliveries) => {
                if let Some(metrics) = &self.metrics {
                    for delivery in &deliveries {
                        match delivery.status {
                            DeliveryStatus::Sent => metrics.notifications_sent_total.inc(),
                            DeliveryStatus::LinkGenerated { .. } => {
                                metrics.notification_links_total.inc()
                            }
                            DeliveryStatus::Failed { .. } => {
                                metrics.notification_failures_total.inc()
                            }
                        }
                    }
                }
                report.deliveries = deliveries;
                report.delivery_error = None;
            }
            Err(e) => {
                log_delivery_error(&e);
                if let Some(metrics) = &self.metrics {
                    metrics.notification_failures_total.inc();
                }
                report.delivery_error = Some(e.to_string());
            }
        }
    }
}

fn log_delivery_error(e: &NotifyError) {
    match e {
        NotifyError::NoRecipients | NotifyError::NotConfigured(_) => {
            info!(error = %e, "MonitorRuntime: alerts not relayed")
        }
        _ => warn!(error = %e, "MonitorRuntime: alert delivery failed"),
    }
}
