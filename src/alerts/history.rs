//! Bounded per-symbol price history.

use std::collections::VecDeque;

pub const MAX_HISTORY: usize = 200;

/// FIFO of distinct consecutive prices, capped at [`MAX_HISTORY`].
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    prices: VecDeque<f64>,
    capacity: usize,
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            prices: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Record `price` unless it equals the last stored one. Returns whether it was stored.
    pub fn record(&mut self, price: f64) -> bool {
        if self.prices.back() == Some(&price) {
            return false;
        }
        self.prices.push_back(price);
        while self.prices.len() > self.capacity {
            self.prices.pop_front();
        }
        true
    }

    pub fn latest(&self) -> Option<f64> {
        self.prices.back().copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.prices.iter()
    }

    /// Oldest first.
    pub fn to_vec(&self) -> Vec<f64> {
        self.prices.iter().copied().collect()
    }
}
