// src/util.rs

use anyhow::{Context, Result};
use std::path::Path;

/// Read a UTF-8 file into a String with a clear error message.
///
/// Used by the CLI for source files and stdin files.
pub fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
}

/// Filter out credentials that are present but obviously not real.
///
/// Treated as absent:
/// - empty / whitespace
/// - `REPLACE_ME`
/// - template values such as `your-quizapi-key-here`
pub fn usable_credential(raw: Option<&str>) -> Option<String> {
    let value = raw?.trim();

    if value.is_empty() || value.eq_ignore_ascii_case("replace_me") {
        return None;
    }

    let lower = value.to_ascii_lowercase();
    if lower.starts_with("your-") && lower.ends_with("-here") {
        return None;
    }

    Some(value.to_string())
}

/// Undo the three HTML entities trivia providers put into question text.
///
/// Replacement order matters: `&amp;` goes last so `&amp;quot;` becomes
/// `&quot;` and not `"`.
pub fn unescape_html(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

/// Render a fixed-point value (`value / 10^places`) without trailing zeros.
///
/// Example: `format_fixed(45, 1)` → `4.5`, `format_fixed(300, 2)` → `3`.
pub fn format_fixed(value: i64, places: u32) -> String {
    let scale = 10i64.pow(places);
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.abs();
    let whole = abs / scale;
    let frac = abs % scale;

    if frac == 0 {
        return format!("{}{}", sign, whole);
    }

    let digits = format!("{:0width$}", frac, width = places as usize);
    format!("{}{}.{}", sign, whole, digits.trim_end_matches('0'))
}

/// Integer division rounding halves up, for non-negative operands.
pub fn div_round(numerator: i64, denominator: i64) -> i64 {
    (2 * numerator + denominator) / (2 * denominator)
}
