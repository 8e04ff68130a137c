//! Landmark index (phase one) and ordered anchor queries (phase two).

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tfasync_shared::markers;

use crate::anchor::{Anchor, NotFound, Span, Wrapper};

// ---------------------------------------------------------------------------
// Landmark table
// ---------------------------------------------------------------------------

/// How a landmark is recognised in raw text.
enum Matcher {
    Literal(&'static str),
    /// Regex; when it has a capture group 1, the recorded span is that group.
    Pattern(Regex),
}

static LANDMARKS: LazyLock<Vec<(Anchor, Matcher)>> = LazyLock::new(|| {
    let re = |pattern: &str| Matcher::Pattern(Regex::new(pattern).expect("valid regex"));
    vec![
        (
            Anchor::NaturalKeyLabel,
            re(&format!(
                r"{}\s*([A-Za-z0-9]+(?:-[A-Za-z0-9]+)*)",
                regex::escape(markers::NATURAL_KEY_LABEL)
            )),
        ),
        (Anchor::BreadcrumbEnd, re(r"</ol>[^\n]*\n?")),
        (
            Anchor::ContentContainer,
            Matcher::Literal(r#"<div class="container-fluid">"#),
        ),
        (Anchor::Table, Matcher::Literal("<table")),
        (Anchor::BlockEnd, re(r"</div>[ \t]*\r?\n\s*</div>")),
        (
            Anchor::WrapperStart(Wrapper::ViewToggle),
            Matcher::Literal(r#"<div class="view-toggle-container""#),
        ),
        (
            Anchor::WrapperEnd(Wrapper::ViewToggle),
            re(r#"(?s)<div class="view-toggle-container"[^>]*>.*?(</div>)"#),
        ),
        (
            Anchor::WrapperStart(Wrapper::ViewPublic),
            Matcher::Literal(markers::VIEW_PUBLIC_START),
        ),
        (
            Anchor::WrapperEnd(Wrapper::ViewPublic),
            re(&format!(
                r"(</div>)\s*{}",
                regex::escape(markers::VIEW_TECHNICAL_START)
            )),
        ),
        (
            Anchor::WrapperStart(Wrapper::ViewTechnical),
            Matcher::Literal(markers::VIEW_TECHNICAL_START),
        ),
        (
            Anchor::WrapperEnd(Wrapper::ViewTechnical),
            Matcher::Literal(markers::VIEW_TECHNICAL_END),
        ),
        (
            Anchor::DisclaimerStart,
            Matcher::Literal(markers::PUBLIC_DISCLAIMER_START),
        ),
        (
            Anchor::Placeholder,
            re(r#"(?is)<h2[^>]*id\s*=\s*["']?mitigations["']?[^>]*>\s*Mitigations\s*</h2>\s*(<p>\s*COMING SOON!.*?</p>)"#),
        ),
        (Anchor::NavEnd, re(r"(</nav>[ \t]*\r?\n)\s*</header>")),
        (Anchor::BodyStart, re(r"<body[^>]*>\r?\n?")),
        (Anchor::BodyEnd, Matcher::Literal("</body>")),
        (
            Anchor::FooterGroupEnd,
            re(r#"<u class="footer-link"><a [^>]*class="footer-link"[^>]*>Contact</a></u>\s*</div>\s*</div>"#),
        ),
    ]
});

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<h([1-6])[\s>]").expect("valid regex"));

// ---------------------------------------------------------------------------
// LandmarkIndex
// ---------------------------------------------------------------------------

/// Every landmark occurrence in a document, sorted by position per anchor.
#[derive(Debug, Clone, Default)]
pub struct LandmarkIndex {
    hits: HashMap<Anchor, Vec<Span>>,
}

impl LandmarkIndex {
    /// Scan `text` once and record all landmark positions.
    pub fn build(text: &str) -> Self {
        let mut hits: HashMap<Anchor, Vec<Span>> = HashMap::new();

        for (anchor, matcher) in LANDMARKS.iter() {
            let spans: Vec<Span> = match matcher {
                Matcher::Literal(lit) => text
                    .match_indices(lit)
                    .map(|(pos, m)| Span::new(pos, pos + m.len()))
                    .collect(),
                Matcher::Pattern(re) => re
                    .captures_iter(text)
                    .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
                    .map(|m| Span::new(m.start(), m.end()))
                    .collect(),
            };
            if !spans.is_empty() {
                hits.insert(*anchor, spans);
            }
        }

        for caps in HEADING_RE.captures_iter(text) {
            let (Some(whole), Some(level)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let level: u8 = level.as_str().parse().unwrap_or(0);
            hits.entry(Anchor::Heading(level))
                .or_default()
                .push(Span::new(whole.start(), level_end(whole.start())));
        }

        tracing::trace!(kinds = hits.len(), "landmark index built");
        Self { hits }
    }

    /// All occurrences of an anchor, in document order.
    pub fn all(&self, anchor: Anchor) -> &[Span] {
        self.hits.get(&anchor).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First occurrence starting at or after `from`.
    pub fn first_after(&self, anchor: Anchor, from: usize) -> Option<Span> {
        self.all(anchor).iter().copied().find(|s| s.start >= from)
    }
}

/// `<hN` is always three bytes.
fn level_end(start: usize) -> usize {
    start + 3
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A document's text together with its landmark index.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    text: &'a str,
    index: LandmarkIndex,
}

impl<'a> Document<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            index: LandmarkIndex::build(text),
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn slice(&self, span: Span) -> &'a str {
        &self.text[span.start..span.end]
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    pub fn has(&self, anchor: Anchor) -> bool {
        !self.index.all(anchor).is_empty()
    }

    /// First occurrence of `anchor` anywhere in the document.
    pub fn locate(&self, anchor: Anchor) -> Result<Span, NotFound> {
        self.locate_after(anchor, 0)
    }

    /// First occurrence of `anchor` starting at or after `from`.
    ///
    /// Chaining calls through previously located positions enforces document
    /// order and keeps look-alike text earlier in the page from matching.
    pub fn locate_after(&self, anchor: Anchor, from: usize) -> Result<Span, NotFound> {
        self.index
            .first_after(anchor, from)
            .ok_or(NotFound { anchor })
    }

    pub fn locate_all(&self, anchor: Anchor) -> &[Span] {
        self.index.all(anchor)
    }

    /// The text strictly between `start` and the nearest following `ends` anchor.
    pub fn region(&self, start: Anchor, ends: &[Anchor]) -> Result<Span, NotFound> {
        let open = self.locate(start)?;
        let close = ends
            .iter()
            .filter_map(|end| self.index.first_after(*end, open.end))
            .map(|s| s.start)
            .min();

        match close {
            Some(close) => Ok(Span::new(open.end, close)),
            None => Err(NotFound {
                anchor: ends.first().copied().unwrap_or(start),
            }),
        }
    }

    /// The declared natural key, if the page carries the `ID:` label.
    pub fn natural_key(&self) -> Option<&'a str> {
        self.locate(Anchor::NaturalKeyLabel)
            .ok()
            .map(|span| self.slice(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<body>
<header>
  <nav>menu</nav>
</header>
<ol class="breadcrumb"><li>Home</li></ol>
<div class="container-fluid">
  <h1>Technical Title</h1>
  <span class="h5 card-title">ID:&nbsp;</span>TFA-T-1001
  <h2 class="pt-3" id ="mitigations">Mitigations</h2>
  <p>COMING SOON! See <a href="/x">here</a>.</p>
</div>
</div>
</body>"#;

    #[test]
    fn finds_natural_key() {
        let doc = Document::new(PAGE);
        assert_eq!(doc.natural_key(), Some("TFA-T-1001"));
    }

    #[test]
    fn missing_anchor_is_not_found() {
        let doc = Document::new("<p>legacy page</p>");
        let err = doc.locate(Anchor::BreadcrumbEnd).unwrap_err();
        assert_eq!(err.anchor, Anchor::BreadcrumbEnd);
        assert_eq!(doc.natural_key(), None);
    }

    #[test]
    fn breadcrumb_end_covers_line_ending() {
        let doc = Document::new(PAGE);
        let span = doc.locate(Anchor::BreadcrumbEnd).unwrap();
        assert!(doc.slice(span).starts_with("</ol>"));
        assert!(doc.slice(span).ends_with('\n'));
    }

    #[test]
    fn placeholder_span_is_the_paragraph_only() {
        let doc = Document::new(PAGE);
        let span = doc.locate(Anchor::Placeholder).unwrap();
        let text = doc.slice(span);
        assert!(text.starts_with("<p>COMING SOON!"));
        assert!(text.ends_with("</p>"));
    }

    #[test]
    fn headings_are_indexed_by_level() {
        let doc = Document::new(PAGE);
        let h1 = doc.locate(Anchor::Heading(1)).unwrap();
        let h2 = doc.locate_after(Anchor::Heading(2), h1.end).unwrap();
        assert!(h2.start > h1.start);
        assert_eq!(doc.slice(h1), "<h1");
    }

    #[test]
    fn locate_after_enforces_order() {
        let text = "<table></table><div class=\"container-fluid\"><table>";
        let doc = Document::new(text);
        let container = doc.locate(Anchor::ContentContainer).unwrap();
        let table = doc.locate_after(Anchor::Table, container.end).unwrap();
        assert!(table.start > container.start);
        assert!(doc.locate_after(Anchor::Table, table.end).is_err());
    }

    #[test]
    fn nav_end_requires_header_close() {
        let doc = Document::new(PAGE);
        let span = doc.locate(Anchor::NavEnd).unwrap();
        assert_eq!(doc.slice(span), "</nav>\n");

        let bare = Document::new("<nav>menu</nav>\n<main>");
        assert!(bare.locate(Anchor::NavEnd).is_err());
    }

    #[test]
    fn region_stops_at_nearest_end() {
        let text = r#"<div class="view-public"><h1>T</h1><div class="public-disclaimer">x</div></div>
<div class="view-technical" style="display: none;">"#;
        let doc = Document::new(text);
        let span = doc
            .region(
                Anchor::WrapperStart(Wrapper::ViewPublic),
                &[
                    Anchor::DisclaimerStart,
                    Anchor::WrapperStart(Wrapper::ViewTechnical),
                ],
            )
            .unwrap();
        assert_eq!(doc.slice(span), "<h1>T</h1>");
    }

    #[test]
    fn region_without_end_is_not_found() {
        let doc = Document::new(r#"<div class="view-public"><h1>T</h1>"#);
        let err = doc
            .region(
                Anchor::WrapperStart(Wrapper::ViewPublic),
                &[Anchor::DisclaimerStart],
            )
            .unwrap_err();
        assert_eq!(err.anchor, Anchor::DisclaimerStart);
    }

    #[test]
    fn view_public_end_is_the_closing_div() {
        let text = "<div class=\"view-public\"><p>x</p>\n    </div>\n    <div class=\"view-technical\" style=\"display: none;\">";
        let doc = Document::new(text);
        let span = doc.locate(Anchor::WrapperEnd(Wrapper::ViewPublic)).unwrap();
        assert_eq!(doc.slice(span), "</div>");
        assert_eq!(&text[span.end..span.end + 5], "\n    ");
    }
}
