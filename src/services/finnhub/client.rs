//! Finnhub REST client

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::messages::{QuoteResponse, SearchResponse};
use crate::config::{get_finnhub_api_key, get_finnhub_base_url};
use crate::error::FetchError;
use crate::models::quote::{Quote, SymbolMatch};
use crate::services::quote_source::QuoteSource;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);
pub const MAX_SEARCH_RESULTS: usize = 10;

pub struct FinnhubClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FinnhubClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(base_url, api_key, http))
    }

    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Build from `FINNHUB_BASE_URL` / `FINNHUB_API_KEY`.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let api_key = get_finnhub_api_key()?;
        Ok(Self::new(get_finnhub_base_url(), api_key)?)
    }

    async fn get<T>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl QuoteSource for FinnhubClient {
    async fn fetch(&self, symbol: &str) -> Result<Quote, FetchError> {
        let raw: QuoteResponse = self.get("quote", &[("symbol", symbol)]).await.map_err(|e| {
            warn!(symbol = %symbol, error = %e, "Finnhub: quote request failed");
            e
        })?;
        if let Some(message) = raw.error.clone() {
            return Err(FetchError::Upstream(message));
        }
        debug!(symbol = %symbol, price = ?raw.c, "Finnhub: quote received");
        Ok(raw.into())
    }

    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let raw: SearchResponse = self.get("search", &[("q", query)]).await?;
        if let Some(message) = raw.error {
            return Err(FetchError::Upstream(message));
        }
        Ok(raw
            .result
            .into_iter()
            .take(MAX_SEARCH_RESULTS)
            .map(Into::into)
            .collect())
    }
}
