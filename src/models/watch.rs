use serde::{Deserialize, Serialize};

/// Per-symbol alert configuration.
///
/// Serialized with the watchlist file's field names: `symbol`, `name`, `alert_pct`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchRule {
    #[serde(deserialize_with = "normalize_symbol_de")]
    pub symbol: String,
    #[serde(rename = "name", alias = "display_name")]
    pub display_name: String,
    #[serde(rename = "alert_pct")]
    pub alert_threshold_pct: f64,
}

impl WatchRule {
    pub fn new(symbol: &str, display_name: &str, alert_threshold_pct: f64) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            display_name: display_name.trim().to_string(),
            alert_threshold_pct,
        }
    }
}

/// Trim and upper-case a ticker.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

fn normalize_symbol_de<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_symbol(&raw))
}
