//! Ordered watchlist with the validation rules applied before rules reach the engine.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::watch::{normalize_symbol, WatchRule};

pub const MIN_THRESHOLD_PCT: f64 = 0.1;
pub const MAX_THRESHOLD_PCT: f64 = 50.0;
pub const DEFAULT_THRESHOLD_PCT: f64 = 2.0;

pub fn default_rules() -> Vec<WatchRule> {
    vec![
        WatchRule::new("CSCO", "Cisco Systems", DEFAULT_THRESHOLD_PCT),
        WatchRule::new("GSK", "GSK plc", DEFAULT_THRESHOLD_PCT),
        WatchRule::new("GOOGL", "Alphabet (Google)", DEFAULT_THRESHOLD_PCT),
    ]
}

pub fn validate_threshold(pct: f64) -> Result<f64, ConfigError> {
    if pct.is_finite() && (MIN_THRESHOLD_PCT..=MAX_THRESHOLD_PCT).contains(&pct) {
        Ok(pct)
    } else {
        Err(ConfigError::InvalidThreshold(pct))
    }
}

/// Watch rules in insertion order, which is also display and evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WatchRule>", into = "Vec<WatchRule>")]
pub struct WatchlistConfig {
    rules: Vec<WatchRule>,
}

impl TryFrom<Vec<WatchRule>> for WatchlistConfig {
    type Error = ConfigError;

    fn try_from(rules: Vec<WatchRule>) -> Result<Self, Self::Error> {
        Self::from_rules(rules)
    }
}

impl From<WatchlistConfig> for Vec<WatchRule> {
    fn from(watchlist: WatchlistConfig) -> Self {
        watchlist.rules
    }
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl WatchlistConfig {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Build from already-parsed rules, enforcing the same checks as [`add`](Self::add).
    pub fn from_rules(rules: Vec<WatchRule>) -> Result<Self, ConfigError> {
        let mut watchlist = Self::empty();
        for rule in rules {
            watchlist.add(&rule.symbol, &rule.display_name, rule.alert_threshold_pct)?;
        }
        Ok(watchlist)
    }

    pub fn rules(&self) -> &[WatchRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&WatchRule> {
        let symbol = normalize_symbol(symbol);
        self.rules.iter().find(|r| r.symbol == symbol)
    }

    pub fn add(
        &mut self,
        symbol: &str,
        display_name: &str,
        alert_threshold_pct: f64,
    ) -> Result<&WatchRule, ConfigError> {
        let rule = WatchRule::new(symbol, display_name, alert_threshold_pct);
        if rule.symbol.is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.rules.iter().any(|r| r.symbol == rule.symbol) {
            return Err(ConfigError::DuplicateSymbol(rule.symbol));
        }
        validate_threshold(alert_threshold_pct)?;

        self.rules.push(rule);
        let index = self.rules.len() - 1;
        Ok(&self.rules[index])
    }

    pub fn remove(&mut self, index: usize) -> Result<WatchRule, ConfigError> {
        if index >= self.rules.len() {
            return Err(ConfigError::IndexOutOfRange(index));
        }
        Ok(self.rules.remove(index))
    }

    pub fn update_threshold(
        &mut self,
        index: usize,
        alert_threshold_pct: f64,
    ) -> Result<&WatchRule, ConfigError> {
        let pct = validate_threshold(alert_threshold_pct)?;
        let rule = self
            .rules
            .get_mut(index)
            .ok_or(ConfigError::IndexOutOfRange(index))?;
        rule.alert_threshold_pct = pct;
        Ok(rule)
    }

    pub fn reset_to_defaults(&mut self) {
        self.rules = default_rules();
    }
}
