//! Breach detection and debounce over a stream of quotes.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::alerts::currency::currency_symbol;
use crate::alerts::debounce::DebounceState;
use crate::alerts::history::PriceHistory;
use crate::core::clock::{Clock, SystemClock};
use crate::models::alert::{AlertEvent, EvaluationResult};
use crate::models::quote::{pct_change, Quote};
use crate::models::watch::WatchRule;

/// Mutable per-symbol memory of the engine. Owned by the caller and passed in by
/// reference; calls for the same state must be serialized.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    histories: HashMap<String, PriceHistory>,
    debounce: DebounceState,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self, symbol: &str) -> Option<&PriceHistory> {
        self.histories.get(symbol)
    }

    pub fn debounce(&self) -> &DebounceState {
        &self.debounce
    }

    /// Drop price history for symbols no longer watched. Debounce timestamps
    /// survive until [`reset`](Self::reset).
    pub fn prune(&mut self, rules: &[WatchRule]) {
        self.histories
            .retain(|symbol, _| rules.iter().any(|r| &r.symbol == symbol));
    }

    pub fn reset(&mut self) {
        self.histories.clear();
        self.debounce.clear();
    }
}

pub struct AlertEngine {
    clock: Arc<dyn Clock>,
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl AlertEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Evaluate one quote for `symbol` against `rule`.
    ///
    /// A missing quote, a quote without a usable price, or a symbol that does not
    /// match the rule yields [`EvaluationResult::NoData`] and leaves `state` untouched.
    pub fn evaluate(
        &self,
        state: &mut EngineState,
        symbol: &str,
        quote: Option<&Quote>,
        rule: &WatchRule,
    ) -> EvaluationResult {
        if symbol.is_empty() || symbol != rule.symbol {
            debug!(symbol = %symbol, rule_symbol = %rule.symbol, "AlertEngine: symbol does not match rule");
            return EvaluationResult::NoData;
        }
        let Some(quote) = quote else {
            return EvaluationResult::NoData;
        };
        let Some(price) = quote.price() else {
            debug!(symbol = %symbol, "AlertEngine: no price in quote");
            return EvaluationResult::NoData;
        };

        let reference = quote.reference_price().unwrap_or(price);
        let change_pct = pct_change(price, reference);

        state
            .histories
            .entry(symbol.to_string())
            .or_default()
            .record(price);

        if change_pct.abs() < rule.alert_threshold_pct {
            return EvaluationResult::Normal(change_pct);
        }

        let now = self.clock.now();
        if !state.debounce.allows(symbol, now) {
            debug!(
                symbol = %symbol,
                change_pct = change_pct,
                "AlertEngine: breach suppressed inside debounce window"
            );
            return EvaluationResult::Suppressed(change_pct);
        }

        state.debounce.record(symbol, now);
        info!(
            symbol = %symbol,
            price = price,
            change_pct = change_pct,
            threshold = rule.alert_threshold_pct,
            "AlertEngine: alert fired for {}",
            symbol
        );

        EvaluationResult::Fired(AlertEvent {
            symbol: symbol.to_string(),
            display_name: rule.display_name.clone(),
            price,
            change_pct,
            threshold_pct: rule.alert_threshold_pct,
            currency_symbol: currency_symbol(symbol).to_string(),
            fired_at: now,
        })
    }

    /// Evaluate every rule in order against the quote snapshot. One result per rule.
    pub fn evaluate_all(
        &self,
        state: &mut EngineState,
        quotes: &HashMap<String, Quote>,
        rules: &[WatchRule],
    ) -> Vec<EvaluationResult> {
        rules
            .iter()
            .map(|rule| self.evaluate(state, &rule.symbol, quotes.get(&rule.symbol), rule))
            .collect()
    }
}
