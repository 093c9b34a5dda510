//! Finnhub REST payloads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::quote::{Quote, SymbolMatch};

/// `GET /quote` body. Unknown symbols come back with every field set to zero.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteResponse {
    #[serde(default)]
    pub c: Option<f64>,
    #[serde(default)]
    pub o: Option<f64>,
    #[serde(default)]
    pub h: Option<f64>,
    #[serde(default)]
    pub l: Option<f64>,
    #[serde(default)]
    pub pc: Option<f64>,
    #[serde(default)]
    pub t: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl From<QuoteResponse> for Quote {
    fn from(raw: QuoteResponse) -> Self {
        Quote {
            current_price: raw.c,
            day_open: raw.o,
            day_high: raw.h,
            day_low: raw.l,
            previous_close: raw.pc,
            observed_at: raw
                .t
                .filter(|t| *t > 0)
                .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub result: Vec<SearchHit>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub display_symbol: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl From<SearchHit> for SymbolMatch {
    fn from(hit: SearchHit) -> Self {
        SymbolMatch {
            symbol: hit.symbol,
            description: hit.description,
            display_symbol: hit.display_symbol,
            kind: hit.kind.filter(|k| !k.is_empty()),
        }
    }
}
