//! Text rendering of fired alerts for WhatsApp.

use crate::models::alert::AlertEvent;

pub const MESSAGE_HEADER: &str = "🚨 *StockWatch Pro Alert*";

/// Render `events` in the order given. The trailing timestamp is the latest
/// `fired_at`, so the output depends on nothing but its input. Returns an empty
/// string when there is nothing to report.
pub fn format_alert_message(events: &[AlertEvent]) -> String {
    let Some(stamp) = events.iter().map(|e| e.fired_at).max() else {
        return String::new();
    };

    let mut blocks = Vec::with_capacity(events.len() + 2);
    blocks.push(format!("{}\n", MESSAGE_HEADER));
    for event in events {
        blocks.push(format!(
            "*{}* ({})\nPrice: {}{:.2}  |  Change: {} {:.2}%\nThreshold: ±{:.1}%",
            event.symbol,
            event.display_name,
            event.currency_symbol,
            event.price,
            event.direction(),
            event.change_pct.abs(),
            event.threshold_pct,
        ));
    }
    blocks.push(format!(
        "\n_Time: {} UTC_",
        stamp.format("%Y-%m-%d %H:%M:%S")
    ));
    blocks.join("\n\n")
}
