use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A breach that passed the debounce window and should be relayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub symbol: String,
    pub display_name: String,
    pub price: f64,
    pub change_pct: f64,
    pub threshold_pct: f64,
    pub currency_symbol: String,
    pub fired_at: DateTime<Utc>,
}

impl AlertEvent {
    pub fn direction(&self) -> Direction {
        Direction::from_change(self.change_pct)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Zero never breaches a positive threshold, so it is folded into `Down`.
    pub fn from_change(change_pct: f64) -> Self {
        if change_pct > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "⬆️ UP"),
            Direction::Down => write!(f, "⬇️ DOWN"),
        }
    }
}

/// Outcome of evaluating one quote against one watch rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum EvaluationResult {
    NoData,
    Normal(f64),
    Suppressed(f64),
    Fired(AlertEvent),
}

impl EvaluationResult {
    pub fn change_pct(&self) -> Option<f64> {
        match self {
            EvaluationResult::NoData => None,
            EvaluationResult::Normal(pct) | EvaluationResult::Suppressed(pct) => Some(*pct),
            EvaluationResult::Fired(event) => Some(event.change_pct),
        }
    }

    pub fn fired(&self) -> Option<&AlertEvent> {
        match self {
            EvaluationResult::Fired(event) => Some(event),
            _ => None,
        }
    }

    pub fn is_breach(&self) -> bool {
        matches!(
            self,
            EvaluationResult::Suppressed(_) | EvaluationResult::Fired(_)
        )
    }
}
