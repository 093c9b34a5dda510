use thiserror::Error;

/// Failure while fetching a quote or searching symbols upstream.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("could not decode upstream payload: {0}")]
    Decode(String),
}

/// Rejections raised at the configuration boundary. None of these ever reach the engine.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("{0} is already in the watchlist")]
    DuplicateSymbol(String),

    #[error("alert threshold {0} is outside [{min}, {max}]", min = crate::config::watchlist::MIN_THRESHOLD_PCT, max = crate::config::watchlist::MAX_THRESHOLD_PCT)]
    InvalidThreshold(f64),

    #[error("index {0} is out of range")]
    IndexOutOfRange(usize),

    #[error("refresh interval must be one of 30, 60, 120 or 300 seconds")]
    InvalidRefreshInterval,

    #[error("recipient needs both a name and a phone number")]
    InvalidRecipient,

    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure while handing an alert to a WhatsApp transport.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("{0} transport is not configured")]
    NotConfigured(&'static str),

    #[error("no recipients configured")]
    NoRecipients,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),
}

impl NotifyError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            NotifyError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            NotifyError::Status(code) => *code == 429 || *code >= 500,
            NotifyError::NotConfigured(_) | NotifyError::NoRecipients => false,
        }
    }
}
