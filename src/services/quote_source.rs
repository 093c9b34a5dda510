//! Quote provider interface consumed by the monitor runtime.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::quote::{Quote, SymbolMatch};

#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Latest quote for `symbol`. Implementations apply their own timeout.
    async fn fetch(&self, symbol: &str) -> Result<Quote, FetchError>;

    /// Look up symbols matching free text. Sources without search return nothing.
    async fn search(&self, _query: &str) -> Result<Vec<SymbolMatch>, FetchError> {
        Ok(Vec::new())
    }
}
