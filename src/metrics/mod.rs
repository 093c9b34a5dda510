//! Prometheus metrics for the HTTP API and the monitor loop.

use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: Counter,
    pub http_requests_in_flight: Gauge,
    pub http_request_duration_seconds: Histogram,
    pub refresh_cycles_total: Counter,
    pub quote_fetch_errors_total: Counter,
    pub alerts_fired_total: Counter,
    pub alerts_suppressed_total: Counter,
    pub notifications_sent_total: Counter,
    pub notification_links_total: Counter,
    pub notification_failures_total: Counter,
    pub watchlist_symbols: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            Counter::with_opts(Opts::new("http_requests_total", "Total HTTP requests served"))?;
        let http_requests_in_flight = Gauge::with_opts(Opts::new(
            "http_requests_in_flight",
            "HTTP requests currently being served",
        ))?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let refresh_cycles_total = Counter::with_opts(Opts::new(
            "refresh_cycles_total",
            "Completed quote refresh cycles",
        ))?;
        let quote_fetch_errors_total = Counter::with_opts(Opts::new(
            "quote_fetch_errors_total",
            "Quote fetches that failed upstream",
        ))?;
        let alerts_fired_total =
            Counter::with_opts(Opts::new("alerts_fired_total", "Price alerts fired"))?;
        let alerts_suppressed_total = Counter::with_opts(Opts::new(
            "alerts_suppressed_total",
            "Breaches suppressed by the debounce window",
        ))?;
        let notifications_sent_total = Counter::with_opts(Opts::new(
            "notifications_sent_total",
            "Alert messages a WhatsApp transport delivered",
        ))?;
        let notification_links_total = Counter::with_opts(Opts::new(
            "notification_links_total",
            "Click-to-chat links generated instead of a send",
        ))?;
        let notification_failures_total = Counter::with_opts(Opts::new(
            "notification_failures_total",
            "Alert messages a WhatsApp transport failed to deliver",
        ))?;
        let watchlist_symbols =
            Gauge::with_opts(Opts::new("watchlist_symbols", "Symbols on the watchlist"))?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(refresh_cycles_total.clone()))?;
        registry.register(Box::new(quote_fetch_errors_total.clone()))?;
        registry.register(Box::new(alerts_fired_total.clone()))?;
        registry.register(Box::new(alerts_suppressed_total.clone()))?;
        registry.register(Box::new(notifications_sent_total.clone()))?;
        registry.register(Box::new(notification_links_total.clone()))?;
        registry.register(Box::new(notification_failures_total.clone()))?;
        registry.register(Box::new(watchlist_symbols.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_requests_in_flight,
            http_request_duration_seconds,
            refresh_cycles_total,
            quote_fetch_errors_total,
            alerts_fired_total,
            alerts_suppressed_total,
            notifications_sent_total,
            notification_links_total,
            notification_failures_total,
            watchlist_symbols,
        })
    }

    /// Render every registered series in the Prometheus text format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
