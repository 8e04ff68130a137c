//! Rewrite existing disclaimer blocks with the current text.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::texts::{MATRIX_DISCLAIMER, PUBLIC_DISCLAIMER, TECHNICAL_DISCLAIMER};

static BLOCKS: LazyLock<[(Regex, &'static str); 3]> = LazyLock::new(|| {
    let re = |pattern: &str| Regex::new(pattern).expect("valid regex");
    [
        (re(r#"(?s)<div class="public-disclaimer">.*?</div>"#), PUBLIC_DISCLAIMER),
        (re(r#"(?s)<div class="technical-disclaimer">.*?</div>"#), TECHNICAL_DISCLAIMER),
        (re(r#"(?s)<div class="matrix-disclaimer view-public">.*?</div>"#), MATRIX_DISCLAIMER),
    ]
});

/// Replace every disclaimer block in `text`; `None` when nothing changed.
pub fn refresh_disclaimers(text: &str) -> Option<String> {
    let mut current = text.to_string();
    for (pattern, replacement) in BLOCKS.iter() {
        current = pattern.replace_all(&current, NoExpand(*replacement)).into_owned();
    }
    (current != text).then_some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_stale_text() {
        let page = "<p>a</p>\n<div class=\"public-disclaimer\">\n<p>Old wording</p>\n</div>\n<p>b</p>";
        let out = refresh_disclaimers(page).unwrap();
        assert!(out.contains("Always consider your physical safety first."));
        assert!(!out.contains("Old wording"));
        assert!(out.ends_with("\n<p>b</p>"));
    }

    #[test]
    fn current_text_is_left_alone() {
        let page = format!("<body>{PUBLIC_DISCLAIMER}{TECHNICAL_DISCLAIMER}</body>");
        assert_eq!(refresh_disclaimers(&page), None);
        assert_eq!(refresh_disclaimers("<p>no disclaimers</p>"), None);
    }
}
