//! Per-symbol suppression of repeat alerts.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

pub const DEBOUNCE_WINDOW_SECS: i64 = 600;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebounceState {
    last_alert: HashMap<String, DateTime<Utc>>,
}

impl DebounceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window() -> Duration {
        Duration::seconds(DEBOUNCE_WINDOW_SECS)
    }

    /// True when `symbol` has never fired, or fired strictly more than the window ago.
    pub fn allows(&self, symbol: &str, now: DateTime<Utc>) -> bool {
        match self.last_alert.get(symbol) {
            None => true,
            Some(last) => now - *last > Self::window(),
        }
    }

    pub fn record(&mut self, symbol: &str, now: DateTime<Utc>) {
        self.last_alert.insert(symbol.to_string(), now);
    }

    pub fn last_alert(&self, symbol: &str) -> Option<DateTime<Utc>> {
        self.last_alert.get(symbol).copied()
    }

    pub fn clear(&mut self) {
        self.last_alert.clear();
    }
}
