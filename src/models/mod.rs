//! Shared data models spanning the engine, services and API layers.

pub mod alert;
pub mod quote;
pub mod watch;

pub use alert::{AlertEvent, Direction, EvaluationResult};
pub use quote::{pct_change, Quote, SymbolMatch};
pub use watch::{normalize_symbol, WatchRule};
