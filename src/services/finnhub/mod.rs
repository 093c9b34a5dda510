//! Finnhub quote and symbol search integration.

pub mod client;
pub mod messages;

pub use client::FinnhubClient;
