//! Alert detection: price history, debounce and message rendering.

pub mod currency;
pub mod debounce;
pub mod engine;
pub mod history;
pub mod message;

pub use currency::currency_symbol;
pub use debounce::{DebounceState, DEBOUNCE_WINDOW_SECS};
pub use engine::{AlertEngine, EngineState};
pub use history::{PriceHistory, MAX_HISTORY};
pub use message::format_alert_message;
