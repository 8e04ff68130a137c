//! Flat CSV listing of every mitigation and detection declaration.
//!
//! One row per declaration, duplicates included, in sorted technique order.
//! Techniques the store does not hold are left out.

use std::collections::BTreeSet;

use serde::Serialize;
use tfasync_shared::{Category, Result, SyncError};

use crate::bundle::Bundle;
use crate::relational::{CatalogueEntry, RelationalData};

const HEADER: [&str; 5] = ["technique_id", "type", "item_id", "item_name", "item_description"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogueRow {
    pub technique_id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub item_id: String,
    pub item_name: String,
    pub item_description: String,
}

impl CatalogueRow {
    fn new(technique_id: &str, kind: &'static str, entry: &CatalogueEntry) -> Self {
        Self {
            technique_id: technique_id.to_string(),
            kind,
            item_id: entry.id.clone(),
            item_name: entry.name.clone(),
            item_description: entry.description.clone(),
        }
    }

    pub fn is_mitigation(&self) -> bool {
        self.kind == "mitigation"
    }
}

pub fn catalogue_rows(store: &Bundle, relational: &RelationalData, source_name: &str) -> Vec<CatalogueRow> {
    let known: BTreeSet<&str> = store
        .of_category(Category::Technique)
        .filter_map(|o| o.natural_key(source_name))
        .collect();

    let mut rows = Vec::new();
    for (key, relations) in relational.iter() {
        if !known.contains(key.as_str()) {
            tracing::debug!(%key, "technique not in store, left out of catalogue");
            continue;
        }
        rows.extend(
            relations
                .mitigations
                .iter()
                .map(|m| CatalogueRow::new(key.as_str(), "mitigation", m)),
        );
        rows.extend(
            relations
                .detections
                .iter()
                .map(|d| CatalogueRow::new(key.as_str(), "detection", d)),
        );
    }
    rows
}

/// Render rows as CSV. The header is written even when there are no rows.
pub fn catalogue_csv(rows: &[CatalogueRow]) -> Result<String> {
    let csv_err = |e: csv::Error| SyncError::Serialization(format!("catalogue CSV: {e}"));

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADER).map_err(csv_err)?;
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| SyncError::Serialization(format!("catalogue CSV: {}", e.error())))?;
    String::from_utf8(bytes).map_err(|e| SyncError::Serialization(format!("catalogue CSV: {e}")))
}
