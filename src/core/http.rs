//! HTTP endpoint server using Axum

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, Level};

use crate::config::watchlist::DEFAULT_THRESHOLD_PCT;
use crate::config::AppConfig;
use crate::core::runtime::MonitorRuntime;
use crate::error::ConfigError;
use crate::metrics::Metrics;
use crate::models::watch::normalize_symbol;

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub runtime: Arc<MonitorRuntime>,
    /// Where config mutations are persisted; `None` keeps them in memory only.
    pub config_path: Option<Arc<PathBuf>>,
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Error body returned by the API: `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        let status = match &e {
            ConfigError::DuplicateSymbol(_) => StatusCode::CONFLICT,
            ConfigError::IndexOutOfRange(_) => StatusCode::NOT_FOUND,
            ConfigError::EmptySymbol
            | ConfigError::InvalidThreshold(_)
            | ConfigError::InvalidRecipient
            | ConfigError::InvalidRefreshInterval
            | ConfigError::Json(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ConfigError::MissingEnv(_) | ConfigError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "stockwatch"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

/// Write the current config to disk when a path is configured.
async fn persist(state: &AppState, config: &AppConfig) -> Result<(), ApiError> {
    if let Some(path) = &state.config_path {
        config.save(path.as_path()).map_err(|e| {
            error!(error = %e, path = %path.display(), "Failed to save config");
            ApiError::from(e)
        })?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct AddStockRequest {
    symbol: String,
    #[serde(alias = "display_name")]
    name: String,
    alert_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct UpdateStockRequest {
    alert_pct: f64,
}

#[derive(Debug, Deserialize)]
struct AddRecipientRequest {
    name: String,
    phone: String,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
}

async fn list_watchlist(State(state): State<AppState>) -> Json<Value> {
    let config = state.runtime.config().read().await;
    Json(json!(config.stocks))
}

async fn add_stock(
    State(state): State<AppState>,
    Json(request): Json<AddStockRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut config = state.runtime.config().write().await;
    let rule = config
        .stocks
        .add(
            &request.symbol,
            &request.name,
            request.alert_pct.unwrap_or(DEFAULT_THRESHOLD_PCT),
        )?
        .clone();
    persist(&state, &config).await?;
    info!(symbol = %rule.symbol, "Added {} to watchlist", rule.symbol);
    Ok((StatusCode::CREATED, Json(json!(rule))))
}

async fn update_stock(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(request): Json<UpdateStockRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut config = state.runtime.config().write().await;
    let rule = config
        .stocks
        .update_threshold(index, request.alert_pct)?
        .clone();
    persist(&state, &config).await?;
    Ok(Json(json!(rule)))
}

async fn delete_stock(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<StatusCode, ApiError> {
    let mut config = state.runtime.config().write().await;
    let removed = config.stocks.remove(index)?;
    persist(&state, &config).await?;
    info!(symbol = %removed.symbol, "Removed {} from watchlist", removed.symbol);
    Ok(StatusCode::NO_CONTENT)
}

/// Restore the default watchlist and forget all history and debounce state
async fn reset_watchlist(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let rules = {
        let mut config = state.runtime.config().write().await;
        config.stocks.reset_to_defaults();
        persist(&state, &config).await?;
        json!(config.stocks)
    };
    state.runtime.reset().await;
    Ok(Json(rules))
}

async fn list_recipients(State(state): State<AppState>) -> Json<Value> {
    let config = state.runtime.config().read().await;
    Json(json!(config.whatsapp.recipients))
}

async fn add_recipient(
    State(state): State<AppState>,
    Json(request): Json<AddRecipientRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut config = state.runtime.config().write().await;
    let recipient = config
        .whatsapp
        .add_recipient(&request.name, &request.phone)?
        .clone();
    persist(&state, &config).await?;
    Ok((StatusCode::CREATED, Json(json!(recipient))))
}

async fn delete_recipient(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<StatusCode, ApiError> {
    let mut config = state.runtime.config().write().await;
    config.whatsapp.remove_recipient(index)?;
    persist(&state, &config).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_config(State(state): State<AppState>) -> Json<AppConfig> {
    Json(state.runtime.config().read().await.clone())
}

async fn import_config(
    State(state): State<AppState>,
    Json(imported): Json<AppConfig>,
) -> Result<Json<AppConfig>, ApiError> {
    imported.validate()?;
    let mut config = state.runtime.config().write().await;
    *config = imported;
    persist(&state, &config).await?;
    info!(symbol_count = config.stocks.len(), "Config imported");
    Ok(Json(config.clone()))
}

/// Run one refresh cycle immediately
async fn refresh(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.runtime.run_cycle().await))
}

async fn latest_report(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let report = state
        .runtime
        .last_report()
        .await
        .ok_or_else(|| ApiError::not_found("no refresh cycle has run yet"))?;
    Ok(Json(json!(report)))
}

async fn price_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let symbol = normalize_symbol(&symbol);
    let prices = state
        .runtime
        .history(&symbol)
        .await
        .ok_or_else(|| ApiError::not_found(format!("no history for {}", symbol)))?;
    Ok(Json(json!({ "symbol": symbol, "prices": prices })))
}

async fn search_symbols(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let matches = state.runtime.source().search(&params.q).await.map_err(|e| {
        error!(error = %e, query = %params.q, "Symbol search failed");
        ApiError::new(StatusCode::BAD_GATEWAY, e.to_string())
    })?;
    Ok(Json(json!(matches)))
}

/// Deliver the alerts of the last cycle through the configured transport
async fn send_alerts(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let report = state
        .runtime
        .send_pending()
        .await
        .ok_or_else(|| ApiError::not_found("no pending alerts"))?;
    Ok(Json(json!({
        "alerts": report.alerts,
        "deliveries": report.deliveries,
        "delivery_error": report.delivery_error,
    })))
}

async fn notifier_status(State(state): State<AppState>) -> Json<Value> {
    let sink = state.runtime.sink().await;
    let status = sink.status().await;
    Json(json!({ "transport": sink.transport(), "status": status }))
}

async fn notifier_qr(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let sink = state.runtime.sink().await;
    let qr = sink
        .pairing_qr()
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_GATEWAY, e.to_string()))?;
    Ok(Json(json!(qr)))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/watchlist", get(list_watchlist).post(add_stock))
        .route("/api/watchlist/reset", post(reset_watchlist))
        .route("/api/watchlist/{index}", put(update_stock).delete(delete_stock))
        .route("/api/recipients", get(list_recipients).post(add_recipient))
        .route("/api/recipients/{index}", delete(delete_recipient))
        .route("/api/config", get(export_config).put(import_config))
        .route("/api/refresh", post(refresh))
        .route("/api/report", get(latest_report))
        .route("/api/history/{symbol}", get(price_history))
        .route("/api/search", get(search_symbols))
        .route("/api/alerts/send", post(send_alerts))
        .route("/api/notifier/status", get(notifier_status))
        .route("/api/notifier/qr", get(notifier_qr))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(
    port: u16,
    runtime: Arc<MonitorRuntime>,
    metrics: Arc<Metrics>,
    config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = AppState {
        health: Arc::new(RwLock::new(HealthStatus::default())),
        metrics,
        start_time: Arc::new(Instant::now()),
        runtime,
        config_path: config_path.map(Arc::new),
    };
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
