//! Compact number formatting for notification text.

/// Format large numbers with `K`, `M` and `B` suffixes.
///
/// Billions keep one decimal, millions and thousands none; anything smaller is
/// printed as a truncated integer.
pub fn format_number(value: f64) -> String {
    if value >= 1_000_000_000.0 {
        format!("{:.1}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.0}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.0}K", value / 1_000.0)
    } else {
        (value as i64).to_string()
    }
}
