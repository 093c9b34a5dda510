//! StockWatch: stock quote monitoring with percentage-move alerts relayed to WhatsApp.

pub mod alerts;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
