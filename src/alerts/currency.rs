/// Currency glyph guessed from the ticker suffix. London listings (`.L`) quote in
/// pounds, everything else is assumed to be dollars. Best effort only: no instrument
/// metadata is consulted.
pub fn currency_symbol(symbol: &str) -> &'static str {
    if symbol.ends_with(".L") {
        "£"
    } else {
        "$"
    }
}
