//! External collaborators: quote providers and WhatsApp transports.

pub mod finnhub;
pub mod notify;
pub mod quote_source;

pub use notify::NotificationSink;
pub use quote_source::QuoteSource;
