//! Text formatting helpers for scan results.
//!
//! Formatting lives here so the scan code stays free of presentation details
//! and output changes stay in one place.

use std::fmt::Display;

/// Arrays longer than this are abbreviated.
const MAX_SHOWN: usize = 6;

/// Values printed at each end of an abbreviated array.
const EDGE: usize = 3;

/// `[a b c ... x y z]`, four decimals per value.
pub fn format_array(values: &[f64]) -> String {
    let fmt = |vs: &[f64]| vs.iter().map(|v| format!("{v:.4}")).collect::<Vec<_>>().join(" ");
    if values.len() <= MAX_SHOWN {
        format!("[{}]", fmt(values))
    } else {
        format!(
            "[{} ... {}]",
            fmt(&values[..EDGE]),
            fmt(&values[values.len() - EDGE..])
        )
    }
}

/// `Debug`-style list for short fixed-size values (`[10, 10]`, `[false, true]`).
pub fn format_list<T: Display>(values: &[T]) -> String {
    let inner = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
    format!("[{inner}]")
}

/// The value, or `None` when unset.
pub fn format_opt<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}

/// Aligned `key = value` block, one pair per line, no trailing newline.
pub fn format_fields(fields: &[(&str, String)]) -> String {
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    fields
        .iter()
        .map(|(k, v)| format!("{k:<width$} = {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}
