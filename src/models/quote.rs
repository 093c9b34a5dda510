use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One price observation for a symbol.
///
/// Only `current_price`, `day_open` and `previous_close` take part in alert
/// evaluation; the rest is carried for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_open: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

fn non_zero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

impl Quote {
    pub fn new(current_price: f64) -> Self {
        Self {
            current_price: Some(current_price),
            ..Self::default()
        }
    }

    pub fn with_day_open(mut self, day_open: f64) -> Self {
        self.day_open = Some(day_open);
        self
    }

    pub fn with_previous_close(mut self, previous_close: f64) -> Self {
        self.previous_close = Some(previous_close);
        self
    }

    pub fn with_range(mut self, day_low: f64, day_high: f64) -> Self {
        self.day_low = Some(day_low);
        self.day_high = Some(day_high);
        self
    }

    pub fn with_observed_at(mut self, observed_at: DateTime<Utc>) -> Self {
        self.observed_at = Some(observed_at);
        self
    }

    /// The usable price, or `None` when the quote carries no data (absent, zero or non-finite).
    pub fn price(&self) -> Option<f64> {
        non_zero(self.current_price)
    }

    /// Baseline for percent change: day open, then previous close, then the current price.
    ///
    /// Day open is missing outside market hours and previous close may be missing for
    /// freshly listed instruments.
    pub fn reference_price(&self) -> Option<f64> {
        non_zero(self.day_open)
            .or_else(|| non_zero(self.previous_close))
            .or(self.current_price)
    }
}

/// Percent change from `reference` to `current`. A zero reference yields exactly `0.0`.
pub fn pct_change(current: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        0.0
    } else {
        ((current - reference) / reference) * 100.0
    }
}

/// A symbol search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}
