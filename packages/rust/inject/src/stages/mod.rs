//! The staged document pipeline.
//!
//! `Unprocessed -> DualViewInjected -> DisclaimersInjected -> TablesPopulated`
//!
//! Each stage's marker records that it has been applied, and each stage
//! requires the marker of the one before it. The tables stage only exists
//! for technique pages.

mod disclaimers;
mod dual_view;
mod tables;

use std::collections::BTreeMap;
use std::fmt;

use tfasync_shared::{NaturalKey, PageKind, markers};
use tfasync_store::{PublicView, RelationalData};

pub use disclaimers::{MatrixDisclaimer, PageDisclaimers};
pub use dual_view::DualView;
pub use tables::RelationTables;

use crate::injector::Injector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    DualView,
    Disclaimers,
    Tables,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::DualView, Stage::Disclaimers, Stage::Tables];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DualView => "dual-view",
            Self::Disclaimers => "disclaimers",
            Self::Tables => "tables",
        }
    }

    pub fn applies_to(self, kind: PageKind) -> bool {
        !matches!((self, kind), (Self::Tables, PageKind::Tactic | PageKind::Matrix))
    }

    pub fn marker(self, kind: PageKind) -> &'static str {
        match (self, kind) {
            (Self::DualView, _) => markers::DUAL_VIEW_MARKER,
            (Self::Disclaimers, PageKind::Matrix) => markers::MATRIX_DISCLAIMER_MARKER,
            (Self::Disclaimers, _) => markers::DISCLAIMERS_MARKER,
            (Self::Tables, _) => markers::TABLES_MARKER,
        }
    }

    /// Whether `text` shows this stage as applied.
    pub fn is_applied(self, kind: PageKind, text: &str) -> bool {
        match self {
            Self::Tables => tables::tables_applied(text),
            _ => text.contains(self.marker(kind)),
        }
    }

    /// Marker of the stage that must already be applied.
    pub fn requires(self, kind: PageKind) -> Option<&'static str> {
        match self {
            Self::DualView => None,
            Self::Disclaimers => Some(Self::DualView.marker(kind)),
            Self::Tables => Some(Self::Disclaimers.marker(kind)),
        }
    }

    /// The state a document is in once this stage has been applied.
    pub fn reached(self) -> DocumentStage {
        match self {
            Self::DualView => DocumentStage::DualViewInjected,
            Self::Disclaimers => DocumentStage::DisclaimersInjected,
            Self::Tables => DocumentStage::TablesPopulated,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a document is in the staged pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentStage {
    Unprocessed,
    DualViewInjected,
    DisclaimersInjected,
    TablesPopulated,
}

impl DocumentStage {
    /// Read the state from the stage markers present in `text`.
    pub fn detect(text: &str, kind: PageKind) -> Self {
        let mut state = Self::Unprocessed;
        for stage in Stage::ALL.into_iter().filter(|s| s.applies_to(kind)) {
            if !stage.is_applied(kind, text) {
                break;
            }
            state = stage.reached();
        }
        state
    }

    /// The next stage to apply, or `None` when the page is complete.
    pub fn next(self, kind: PageKind) -> Option<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|s| s.applies_to(kind))
            .find(|s| s.reached() > self)
    }
}

/// Store and relational data the stage injectors render from.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub techniques: &'a BTreeMap<NaturalKey, PublicView>,
    pub tactics: &'a BTreeMap<NaturalKey, PublicView>,
    pub relational: &'a RelationalData,
}

/// The injector for `stage` on a page of `kind`.
///
/// `fallback_key` is used when the page does not declare its own key
/// (usually the page's directory name). Returns `None` when the stage does
/// not apply to this kind of page.
pub fn injector_for<'a>(
    stage: Stage,
    kind: PageKind,
    fallback_key: Option<&'a str>,
    ctx: StageContext<'a>,
) -> Option<Box<dyn Injector + 'a>> {
    if !stage.applies_to(kind) {
        return None;
    }
    let injector: Box<dyn Injector + 'a> = match (stage, kind) {
        (Stage::DualView, _) => Box::new(DualView::new(kind, fallback_key, ctx)),
        (Stage::Disclaimers, PageKind::Matrix) => Box::new(MatrixDisclaimer),
        (Stage::Disclaimers, _) => Box::new(PageDisclaimers),
        (Stage::Tables, _) => Box::new(RelationTables::new(fallback_key, ctx.relational)),
    };
    Some(injector)
}

/// The page's declared key, else the fallback.
pub(crate) fn page_key<'a>(
    doc: &tfasync_anchors::Document<'a>,
    fallback: Option<&'a str>,
) -> Option<&'a str> {
    doc.natural_key().or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_stage_from_markers() {
        let kind = PageKind::Technique;
        assert_eq!(DocumentStage::detect("<p>plain</p>", kind), DocumentStage::Unprocessed);
        let dual = r#"<div class="view-toggle-container">"#;
        assert_eq!(DocumentStage::detect(dual, kind), DocumentStage::DualViewInjected);
        let both = format!(r#"{dual}<div class="public-disclaimer">"#);
        assert_eq!(DocumentStage::detect(&both, kind), DocumentStage::DisclaimersInjected);
    }

    #[test]
    fn stray_later_marker_does_not_skip_ahead() {
        let text = r#"<table class="table table-bordered relation-table">"#;
        assert_eq!(
            DocumentStage::detect(text, PageKind::Technique),
            DocumentStage::Unprocessed
        );
    }

    #[test]
    fn tables_stage_is_technique_only() {
        assert_eq!(
            DocumentStage::DisclaimersInjected.next(PageKind::Tactic),
            None
        );
        assert_eq!(
            DocumentStage::DisclaimersInjected.next(PageKind::Technique),
            Some(Stage::Tables)
        );
        assert_eq!(DocumentStage::Unprocessed.next(PageKind::Matrix), Some(Stage::DualView));
    }

    #[test]
    fn matrix_uses_its_own_disclaimer_marker() {
        assert_eq!(Stage::Disclaimers.marker(PageKind::Matrix), "matrix-disclaimer");
        assert_eq!(Stage::Tables.requires(PageKind::Technique), Some("public-disclaimer"));
    }
}
