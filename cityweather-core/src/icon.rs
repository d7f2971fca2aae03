//! Upstream icon codes and the presentation symbols they map to.
//!
//! The core never rewrites icon codes; snapshots carry them exactly as
//! received. This table is for front ends that want a symbol name.

/// Symbol used for codes outside the table.
pub const FALLBACK_SYMBOL: &str = "cloud";

const ICON_SYMBOLS: [(&str, &str); 18] = [
    ("01d", "sun.max.fill"),
    ("01n", "moon.stars.fill"),
    ("02d", "cloud.sun.fill"),
    ("02n", "cloud.moon.fill"),
    ("03d", "cloud.fill"),
    ("03n", "cloud.fill"),
    ("04d", "smoke.fill"),
    ("04n", "smoke.fill"),
    ("09d", "cloud.drizzle.fill"),
    ("09n", "cloud.drizzle.fill"),
    ("10d", "cloud.heavyrain.fill"),
    ("10n", "cloud.heavyrain.fill"),
    ("11d", "cloud.bolt.fill"),
    ("11n", "cloud.bolt.fill"),
    ("13d", "snowflake"),
    ("13n", "snowflake"),
    ("50d", "cloud.fog.fill"),
    ("50n", "cloud.fog.fill"),
];

/// Symbol name for an upstream icon code, or [`FALLBACK_SYMBOL`].
pub fn symbol_for(icon: &str) -> &'static str {
    ICON_SYMBOLS
        .iter()
        .find(|(code, _)| *code == icon)
        .map(|(_, symbol)| *symbol)
        .unwrap_or(FALLBACK_SYMBOL)
}

pub fn is_known(icon: &str) -> bool {
    ICON_SYMBOLS.iter().any(|(code, _)| *code == icon)
}

pub fn known_codes() -> impl Iterator<Item = &'static str> {
    ICON_SYMBOLS.iter().map(|(code, _)| *code)
}

/// Whether the code is a night variant (`n` suffix).
pub fn is_night(icon: &str) -> bool {
    icon.ends_with('n')
}
