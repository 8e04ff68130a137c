//! The check-then-apply injection contract.

use std::fmt;

use tfasync_anchors::{Document, NotFound, Span};

/// Replace `span` with `text`. A zero-width span is a pure insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub span: Span,
    pub text: String,
}

impl Splice {
    pub fn insert(pos: usize, text: impl Into<String>) -> Self {
        Self {
            span: Span::at(pos),
            text: text.into(),
        }
    }

    pub fn replace(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }
}

/// Why an injector left a document untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A required landmark is absent (legacy or unexpected layout).
    MissingAnchor(NotFound),
    /// The preceding stage has not been applied yet; holds its marker.
    StageNotReached(&'static str),
    /// The store holds nothing to render for this page.
    NoData(String),
    /// Planned edits overlap each other.
    OverlappingEdits,
    /// The edits would not have written the stage marker.
    MarkerNotWritten,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAnchor(miss) => write!(f, "{miss}"),
            Self::StageNotReached(marker) => write!(f, "previous stage not applied (no `{marker}`)"),
            Self::NoData(key) => write!(f, "no store data for {key}"),
            Self::OverlappingEdits => f.write_str("planned edits overlap"),
            Self::MarkerNotWritten => f.write_str("edits would not write the stage marker"),
        }
    }
}

impl From<NotFound> for SkipReason {
    fn from(miss: NotFound) -> Self {
        Self::MissingAnchor(miss)
    }
}

/// One idempotent document transition.
pub trait Injector {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Literal whose presence means this injector already ran.
    fn marker(&self) -> &'static str;

    /// Whether this injector already ran on `text`.
    fn applied(&self, text: &str) -> bool {
        text.contains(self.marker())
    }

    /// Marker that must be present before this injector may run.
    fn requires(&self) -> Option<&'static str> {
        None
    }

    /// Locate anchors and plan every edit. Nothing is applied on `Err`.
    fn plan(&self, doc: &Document<'_>) -> Result<Vec<Splice>, SkipReason>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectOutcome {
    Applied(String),
    AlreadyApplied,
    Skipped(SkipReason),
}

impl InjectOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Run `injector` against `text`.
pub fn inject(text: &str, injector: &dyn Injector) -> InjectOutcome {
    if injector.applied(text) {
        return InjectOutcome::AlreadyApplied;
    }
    if let Some(required) = injector.requires() {
        if !text.contains(required) {
            return InjectOutcome::Skipped(SkipReason::StageNotReached(required));
        }
    }

    let doc = Document::new(text);
    let splices = match injector.plan(&doc) {
        Ok(splices) => splices,
        Err(reason) => return InjectOutcome::Skipped(reason),
    };

    let Some(output) = apply(text, splices) else {
        return InjectOutcome::Skipped(SkipReason::OverlappingEdits);
    };
    if !output.contains(injector.marker()) {
        return InjectOutcome::Skipped(SkipReason::MarkerNotWritten);
    }
    InjectOutcome::Applied(output)
}

/// Apply splices in document order. Insertions at the same position keep
/// their planned order. Returns `None` if two edits overlap.
fn apply(text: &str, mut splices: Vec<Splice>) -> Option<String> {
    splices.sort_by_key(|s| (s.span.start, s.span.end));

    let extra: usize = splices.iter().map(|s| s.text.len()).sum();
    let mut out = String::with_capacity(text.len() + extra);
    let mut cursor = 0;
    for splice in &splices {
        if splice.span.start < cursor || splice.span.end > text.len() {
            return None;
        }
        out.push_str(&text[cursor..splice.span.start]);
        out.push_str(&splice.text);
        cursor = splice.span.end;
    }
    out.push_str(&text[cursor..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfasync_anchors::Anchor;

    struct Greeting;

    impl Injector for Greeting {
        fn name(&self) -> &'static str {
            "greeting"
        }
        fn marker(&self) -> &'static str {
            "hello-marker"
        }
        fn plan(&self, doc: &Document<'_>) -> Result<Vec<Splice>, SkipReason> {
            let body = doc.locate(Anchor::BodyEnd)?;
            Ok(vec![
                Splice::insert(body.start, "<p class=\"hello-marker\">hi</p>"),
                Splice::insert(0, "<!-- top -->"),
            ])
        }
    }

    #[test]
    fn applies_all_edits_in_document_order() {
        let out = inject("<body></body>", &Greeting);
        assert_eq!(
            out,
            InjectOutcome::Applied("<!-- top --><body><p class=\"hello-marker\">hi</p></body>".into())
        );
    }

    #[test]
    fn second_run_is_a_no_op() {
        let InjectOutcome::Applied(once) = inject("<body></body>", &Greeting) else {
            panic!("expected first run to apply");
        };
        assert_eq!(inject(&once, &Greeting), InjectOutcome::AlreadyApplied);
    }

    #[test]
    fn missing_anchor_skips_softly() {
        let out = inject("<p>no body</p>", &Greeting);
        assert_eq!(
            out,
            InjectOutcome::Skipped(SkipReason::MissingAnchor(NotFound::from(Anchor::BodyEnd)))
        );
    }

    #[test]
    fn overlapping_edits_are_rejected() {
        let edits = vec![
            Splice::replace(Span::new(0, 4), "x"),
            Splice::replace(Span::new(2, 6), "y"),
        ];
        assert_eq!(apply("abcdefgh", edits), None);
    }

    #[test]
    fn same_position_inserts_keep_plan_order() {
        let edits = vec![Splice::insert(1, "1"), Splice::insert(1, "2")];
        assert_eq!(apply("ab", edits).as_deref(), Some("a12b"));
    }
}
