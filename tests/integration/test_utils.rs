//! Shared stubs for integration tests

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use stockwatch::config::whatsapp::{Recipient, Transport};
use stockwatch::config::AppConfig;
use stockwatch::core::clock::ManualClock;
use stockwatch::core::http::{create_router, AppState, HealthStatus};
use stockwatch::core::runtime::MonitorRuntime;
use stockwatch::error::{FetchError, NotifyError};
use stockwatch::metrics::Metrics;
use stockwatch::models::{AlertEvent, Quote, SymbolMatch};
use stockwatch::services::notify::{DeliveryReport, DeliveryStatus, NotificationSink};
use stockwatch::services::quote_source::QuoteSource;
use tokio::sync::{Mutex, RwLock};

/// Quote source answering from a table; unknown symbols fail like an upstream error.
#[derive(Default)]
pub struct StubQuoteSource {
    quotes: Mutex<HashMap<String, Quote>>,
}

impl StubQuoteSource {
    pub async fn set(&self, symbol: &str, quote: Quote) {
        self.quotes.lock().await.insert(symbol.to_string(), quote);
    }

    pub async fn remove(&self, symbol: &str) {
        self.quotes.lock().await.remove(symbol);
    }
}

#[async_trait]
impl QuoteSource for StubQuoteSource {
    async fn fetch(&self, symbol: &str) -> Result<Quote, FetchError> {
        self.quotes
            .lock()
            .await
            .get(symbol)
            .cloned()
            .ok_or_else(|| FetchError::Upstream(format!("unknown symbol {}", symbol)))
    }

    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, FetchError> {
        let quotes = self.quotes.lock().await;
        let query = query.to_ascii_uppercase();
        let mut hits: Vec<SymbolMatch> = quotes
            .keys()
            .filter(|s| s.contains(&query))
            .map(|s| SymbolMatch {
                symbol: s.clone(),
                description: format!("{} Inc", s),
                display_symbol: None,
                kind: None,
            })
            .collect();
        hits.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(hits)
    }
}

/// Sink that records every delivery and reports success for one fixed recipient.
#[derive(Default)]
pub struct RecordingSink {
    pub deliveries: Mutex<Vec<(Vec<AlertEvent>, String)>>,
}

impl RecordingSink {
    pub async fn count(&self) -> usize {
        self.deliveries.lock().await.len()
    }

    pub async fn last_message(&self) -> Option<String> {
        self.deliveries.lock().await.last().map(|(_, m)| m.clone())
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    fn transport(&self) -> Transport {
        Transport::DeepLink
    }

    async fn deliver(
        &self,
        events: &[AlertEvent],
        message: &str,
    ) -> Result<Vec<DeliveryReport>, NotifyError> {
        self.deliveries
            .lock()
            .await
            .push((events.to_vec(), message.to_string()));
        Ok(vec![DeliveryReport {
            recipient: Recipient {
                name: "Ops".to_string(),
                phone: "+447700900000".to_string(),
            },
            status: DeliveryStatus::Sent,
        }])
    }
}

pub fn at(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(seconds)
}

/// Runtime wired to stubs, with handles to every stub.
pub struct TestRuntime {
    pub runtime: Arc<MonitorRuntime>,
    pub source: Arc<StubQuoteSource>,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
    pub metrics: Arc<Metrics>,
}

impl TestRuntime {
    pub fn new(config: AppConfig) -> Self {
        let source = Arc::new(StubQuoteSource::default());
        let sink = Arc::new(RecordingSink::default());
        let clock = Arc::new(ManualClock::at_epoch());
        let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
        let runtime = Arc::new(
            MonitorRuntime::new(Arc::new(RwLock::new(config)), source.clone())
                .with_clock(clock.clone())
                .with_sink(sink.clone())
                .with_metrics(metrics.clone()),
        );
        Self {
            runtime,
            source,
            sink,
            clock,
            metrics,
        }
    }
}

/// HTTP server on top of a [`TestRuntime`].
#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub stubs: TestRuntime,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let stubs = TestRuntime::new(config);
        let state = AppState {
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics: stubs.metrics.clone(),
            start_time: Arc::new(Instant::now()),
            runtime: stubs.runtime.clone(),
            config_path: None,
        };
        let server = TestServer::new(create_router(state)).expect("start test server");
        Self { server, stubs }
    }
}
