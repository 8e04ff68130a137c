//! Text cleanup applied to every extracted field.
//!
//! Each pass is a function `&str -> String` applied in sequence. Markup and
//! entities are already gone by the time text gets here: scraper yields
//! decoded text nodes.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on one field's raw text.
pub fn clean_text(raw: &str) -> String {
    let mut result = collapse_whitespace(raw);
    result = strip_warning_glyph(&result);
    result = result.trim().to_string();
    result
}

/// Collapse runs of whitespace (including newlines and nbsp) to one space.
fn collapse_whitespace(text: &str) -> String {
    static WS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[\s\u{00A0}]+").expect("valid regex"));
    WS_RE.replace_all(text, " ").into_owned()
}

/// Drop a leading ⚠ (with or without the emoji variation selector).
fn strip_warning_glyph(text: &str) -> String {
    let trimmed = text.trim_start();
    match trimmed.strip_prefix('\u{26A0}') {
        Some(rest) => rest.strip_prefix('\u{FE0F}').unwrap_or(rest).to_string(),
        None => trimmed.to_string(),
    }
}
