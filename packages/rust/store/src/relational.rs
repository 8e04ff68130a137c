//! Authoritative relational data: mitigations and detections per technique.
//!
//! Hand-maintained, read-only input shaped as
//! `{ "<key>": { "mitigations": [...], "detections": [...] } }`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tfasync_shared::{NaturalKey, Result, SyncError};

/// One mitigation or detection declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueRelations {
    #[serde(default)]
    pub mitigations: Vec<CatalogueEntry>,
    #[serde(default)]
    pub detections: Vec<CatalogueEntry>,
}

/// Relations keyed by technique natural key, iterated in sorted key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationalData(BTreeMap<NaturalKey, TechniqueRelations>);

impl RelationalData {
    pub fn from_json(text: &str) -> Result<Self> {
        let data: RelationalData = serde_json::from_str(text)
            .map_err(|e| SyncError::parse(format!("invalid relational data: {e}")))?;
        for (key, relations) in data.iter() {
            let blank = relations
                .mitigations
                .iter()
                .chain(&relations.detections)
                .any(|entry| entry.id.trim().is_empty());
            if blank {
                return Err(SyncError::validation(format!(
                    "relational data for {key} has an entry with an empty id"
                )));
            }
        }
        Ok(data)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
        let data = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), techniques = data.len(), "loaded relational data");
        Ok(data)
    }

    pub fn get(&self, key: &str) -> Option<&TechniqueRelations> {
        self.0.get(&NaturalKey::from(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaturalKey, &TechniqueRelations)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &NaturalKey> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(NaturalKey, TechniqueRelations)> for RelationalData {
    fn from_iter<I: IntoIterator<Item = (NaturalKey, TechniqueRelations)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
