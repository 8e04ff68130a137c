//! Tables stage: mitigation and detection tables replace the placeholder.

use tfasync_anchors::{Anchor, Document};
use tfasync_shared::markers;
use tfasync_store::{RelationalData, TechniqueRelations};

use super::page_key;
use crate::injector::{Injector, SkipReason, Splice};
use crate::render::relation_tables;

pub struct RelationTables<'a> {
    fallback_key: Option<&'a str>,
    relational: &'a RelationalData,
}

impl<'a> RelationTables<'a> {
    pub fn new(fallback_key: Option<&'a str>, relational: &'a RelationalData) -> Self {
        Self {
            fallback_key,
            relational,
        }
    }
}

/// Whether `text` already carries relation tables, generated now or by the
/// older tooling.
pub(crate) fn tables_applied(text: &str) -> bool {
    if text.contains(markers::TABLES_MARKER) {
        return true;
    }
    text.contains(markers::LEGACY_TABLE_CLASS)
        && text.contains(markers::LEGACY_MITIGATION_PREFIX)
        && !Document::new(text).has(Anchor::Placeholder)
}

impl Injector for RelationTables<'_> {
    fn name(&self) -> &'static str {
        "tables"
    }

    fn marker(&self) -> &'static str {
        markers::TABLES_MARKER
    }

    fn applied(&self, text: &str) -> bool {
        tables_applied(text)
    }

    fn requires(&self) -> Option<&'static str> {
        Some(markers::DISCLAIMERS_MARKER)
    }

    fn plan(&self, doc: &Document<'_>) -> Result<Vec<Splice>, SkipReason> {
        let key = page_key(doc, self.fallback_key)
            .ok_or(SkipReason::MissingAnchor(Anchor::NaturalKeyLabel.into()))?;
        let placeholder = doc.locate(Anchor::Placeholder)?;

        let empty = TechniqueRelations::default();
        let relations = self.relational.get(key).unwrap_or(&empty);
        tracing::debug!(
            key,
            mitigations = relations.mitigations.len(),
            detections = relations.detections.len(),
            "rendering relation tables"
        );
        Ok(vec![Splice::replace(
            placeholder,
            relation_tables(&relations.mitigations, &relations.detections),
        )])
    }
}
