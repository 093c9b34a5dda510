//! StockWatch Server
//!
//! Polls quotes on the configured refresh interval, fires price alerts and
//! serves the watchlist/alert HTTP API.

use dotenvy::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use stockwatch::config::{self, AppConfig};
use stockwatch::core::http::start_server;
use stockwatch::core::runtime::MonitorRuntime;
use stockwatch::core::scheduler::RefreshScheduler;
use stockwatch::logging;
use stockwatch::metrics::Metrics;
use stockwatch::services::finnhub::FinnhubClient;
use tokio::signal;
use tokio::sync::RwLock;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let env = config::get_environment();
    let port = config::get_port();
    let config_path = PathBuf::from(config::get_config_path());

    info!("Starting StockWatch");
    info!(environment = %env, "Environment");

    let app_config = AppConfig::load_or_default(&config_path);
    app_config.validate()?;
    let refresh_interval = app_config.refresh_interval;
    info!(
        symbols = ?app_config.stocks.rules().iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(),
        transport = ?app_config.whatsapp.transport,
        "Loaded watchlist from {}",
        config_path.display()
    );

    let metrics = Arc::new(Metrics::new()?);
    let source = Arc::new(FinnhubClient::from_env()?);

    let runtime = Arc::new(
        MonitorRuntime::new(Arc::new(RwLock::new(app_config)), source)
            .with_metrics(metrics.clone()),
    );

    info!(interval = refresh_interval, "Refresh: every {} seconds", refresh_interval);
    let scheduler = RefreshScheduler::new(runtime.clone(), refresh_interval)?;
    scheduler.start().await;

    // First cycle right away rather than waiting for the first tick
    let initial = runtime.run_cycle().await;
    info!(
        alert_count = initial.alerts.len(),
        "Initial refresh complete"
    );

    let server_runtime = runtime.clone();
    let server_metrics = metrics.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, server_runtime, server_metrics, Some(config_path)).await {
            error!(error = %e, "HTTP server error");
        }
    });

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down...");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    scheduler.stop().await;
    info!("StockWatch stopped");
    Ok(())
}
