//! Technique cells on the matrix overview page.

use std::sync::LazyLock;

use regex::Regex;

use crate::anchor::Span;

static CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(<div class="technique-cell[^"]*"[^>]*>)\s*<a href="(/techniques/([A-Za-z0-9]+(?:-[A-Za-z0-9]+)*)/?)"([^>]*)>([^<]+)</a>"#,
    )
    .expect("valid regex")
});

/// One `technique-cell` div and the link it opens with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechniqueCell {
    /// The whole match, from `<div` through `</a>`.
    pub span: Span,
    pub open_tag: String,
    pub href: String,
    pub key: String,
    /// Extra attributes on the `<a>` after `href`.
    pub link_attrs: String,
    pub title: String,
}

/// Every technique cell in document order.
pub fn technique_cells(text: &str) -> Vec<TechniqueCell> {
    CELL_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(TechniqueCell {
                span: Span::new(whole.start(), whole.end()),
                open_tag: caps.get(1)?.as_str().to_string(),
                href: caps.get(2)?.as_str().to_string(),
                key: caps.get(3)?.as_str().to_string(),
                link_attrs: caps.get(4)?.as_str().to_string(),
                title: caps.get(5)?.as_str().to_string(),
            })
        })
        .collect()
}
