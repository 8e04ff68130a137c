//! Anchor kinds, byte spans, and the soft-failure value.

use std::fmt;

/// A half-open byte range `[start, end)` into a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `pos`, used for pure insertion points.
    pub fn at(pos: usize) -> Self {
        Self { start: pos, end: pos }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Named content wrappers written by the dual-view stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Wrapper {
    ViewToggle,
    ViewPublic,
    ViewTechnical,
}

impl fmt::Display for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ViewToggle => "view-toggle-container",
            Self::ViewPublic => "view-public",
            Self::ViewTechnical => "view-technical",
        };
        f.write_str(s)
    }
}

/// Structural landmarks the locator can find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Anchor {
    /// The natural key following the `ID:` card label (span covers the key).
    NaturalKeyLabel,
    /// `</ol>` through the end of its line; insertion goes after it.
    BreadcrumbEnd,
    /// `<div class="container-fluid">`.
    ContentContainer,
    /// Opening `<hN` of a heading of the given level.
    Heading(u8),
    /// Opening `<table`.
    Table,
    /// A `</div>` immediately followed on the next line by another `</div>`.
    BlockEnd,
    WrapperStart(Wrapper),
    /// The closing `</div>` of a wrapper.
    WrapperEnd(Wrapper),
    /// Opening tag of the public disclaimer.
    DisclaimerStart,
    /// The pending-content paragraph under the Mitigations heading.
    Placeholder,
    /// `</nav>` and its line ending, when directly followed by `</header>`.
    NavEnd,
    /// `<body ...>` and its line ending.
    BodyStart,
    BodyEnd,
    /// End of the footer link row holding the Contact link.
    FooterGroupEnd,
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NaturalKeyLabel => f.write_str("natural-key label"),
            Self::BreadcrumbEnd => f.write_str("breadcrumb end"),
            Self::ContentContainer => f.write_str("content container"),
            Self::Heading(level) => write!(f, "h{level} heading"),
            Self::Table => f.write_str("table"),
            Self::BlockEnd => f.write_str("block end"),
            Self::WrapperStart(w) => write!(f, "{w} start"),
            Self::WrapperEnd(w) => write!(f, "{w} end"),
            Self::DisclaimerStart => f.write_str("disclaimer start"),
            Self::Placeholder => f.write_str("mitigations placeholder"),
            Self::NavEnd => f.write_str("header nav end"),
            Self::BodyStart => f.write_str("body start"),
            Self::BodyEnd => f.write_str("body end"),
            Self::FooterGroupEnd => f.write_str("footer link group end"),
        }
    }
}

/// An anchor the document does not contain (at or after the requested position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("anchor not found: {anchor}")]
pub struct NotFound {
    pub anchor: Anchor,
}

impl From<Anchor> for NotFound {
    fn from(anchor: Anchor) -> Self {
        Self { anchor }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_read_naturally() {
        assert_eq!(Anchor::Heading(2).to_string(), "h2 heading");
        assert_eq!(
            Anchor::WrapperEnd(Wrapper::ViewTechnical).to_string(),
            "view-technical end"
        );
        let miss = NotFound::from(Anchor::Placeholder);
        assert_eq!(miss.to_string(), "anchor not found: mitigations placeholder");
    }

    #[test]
    fn span_helpers() {
        let s = Span::at(7);
        assert!(s.is_empty());
        assert_eq!(Span::new(3, 10).len(), 7);
    }
}
