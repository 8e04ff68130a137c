//! Disclaimer stage.

use tfasync_anchors::{Anchor, Document, Wrapper};
use tfasync_shared::markers;

use crate::injector::{Injector, SkipReason, Splice};
use crate::texts::{MATRIX_DISCLAIMER, PUBLIC_DISCLAIMER, TECHNICAL_DISCLAIMER};

/// Public disclaimer at the end of the public view, technical disclaimer at
/// the end of the technical wrapper.
pub struct PageDisclaimers;

impl Injector for PageDisclaimers {
    fn name(&self) -> &'static str {
        "disclaimers"
    }

    fn marker(&self) -> &'static str {
        markers::DISCLAIMERS_MARKER
    }

    fn requires(&self) -> Option<&'static str> {
        Some(markers::DUAL_VIEW_MARKER)
    }

    fn plan(&self, doc: &Document<'_>) -> Result<Vec<Splice>, SkipReason> {
        let public_end = doc.locate(Anchor::WrapperEnd(Wrapper::ViewPublic))?;
        let technical_end = doc.locate_after(Anchor::WrapperEnd(Wrapper::ViewTechnical), public_end.end)?;

        // Whitespace before the technical close is replaced, not kept.
        let before = &doc.text()[..technical_end.start];
        let trimmed = before.trim_end().len();

        Ok(vec![
            Splice::insert(
                public_end.start,
                format!("{PUBLIC_DISCLAIMER}\n                                "),
            ),
            Splice::replace(
                tfasync_anchors::Span::new(trimmed, technical_end.start),
                format!("\n{TECHNICAL_DISCLAIMER}\n                            "),
            ),
        ])
    }
}

/// Matrix disclaimer directly after the view toggle.
pub struct MatrixDisclaimer;

impl Injector for MatrixDisclaimer {
    fn name(&self) -> &'static str {
        "matrix-disclaimer"
    }

    fn marker(&self) -> &'static str {
        markers::MATRIX_DISCLAIMER_MARKER
    }

    fn requires(&self) -> Option<&'static str> {
        Some(markers::DUAL_VIEW_MARKER)
    }

    fn plan(&self, doc: &Document<'_>) -> Result<Vec<Splice>, SkipReason> {
        let toggle_end = doc.locate(Anchor::WrapperEnd(Wrapper::ViewToggle))?;
        Ok(vec![Splice::insert(toggle_end.end, format!("\n{MATRIX_DISCLAIMER}"))])
    }
}
