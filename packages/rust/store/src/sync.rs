//! The bundle synchronizer.
//!
//! Every pass works on an in-memory copy of the store:
//!
//! 1. reset: drop generated objects and generated relationships
//! 2. rebuild mitigations and detection indicators from relational data
//! 3. overwrite public fields of matched authored objects
//! 4. rebuild relationships, dropping any whose endpoints do not resolve
//! 5. coverage gate: below the configured minimum, discard everything
//!
//! Only an [`SyncOutcome::Applied`] result may be written back to disk.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tfasync_shared::{AppConfig, Category, NaturalKey, PublicRecord, RelationshipType, Result};
use tracing::{debug, info, instrument, warn};

use crate::bundle::{Bundle, StixObject};
use crate::fields::{self, write_public_record};
use crate::graph::GraphBuilder;
use crate::relational::{CatalogueEntry, RelationalData};

// ---------------------------------------------------------------------------
// Inputs and report
// ---------------------------------------------------------------------------

/// Extraction results for one pass.
#[derive(Debug, Clone, Default)]
pub struct ExtractionBatch {
    /// Accepted records by natural key.
    pub records: BTreeMap<NaturalKey, PublicRecord>,
    /// Keyed documents that yielded no record, with the reason.
    pub omitted: BTreeMap<NaturalKey, String>,
}

impl ExtractionBatch {
    /// Natural keys of every keyed document that was attempted.
    pub fn attempted(&self) -> BTreeSet<NaturalKey> {
        self.records
            .keys()
            .chain(self.omitted.keys())
            .cloned()
            .collect()
    }
}

/// A relationship that was not stored because an endpoint did not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRelationship {
    pub source: String,
    pub relationship_type: String,
    pub target: String,
    pub reason: String,
}

impl std::fmt::Display for DroppedRelationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} ({})",
            self.source, self.relationship_type, self.target, self.reason
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coverage {
    pub matched: usize,
    pub expected: usize,
    pub minimum: f64,
}

impl Coverage {
    /// Fraction of expected keys that matched; an empty expectation is full coverage.
    pub fn ratio(&self) -> f64 {
        if self.expected == 0 {
            1.0
        } else {
            self.matched as f64 / self.expected as f64
        }
    }

    pub fn passes(&self) -> bool {
        self.ratio() >= self.minimum
    }
}

/// Technique objects carrying a public title after the pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verification {
    pub techniques: usize,
    pub with_public_title: usize,
    pub missing: Vec<NaturalKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub removed: usize,
    pub mitigations_added: usize,
    pub detections_added: usize,
    pub relationships_added: usize,
    /// Declarations folded into an earlier object with the same id.
    pub duplicate_declarations: usize,
    pub matched: Vec<NaturalKey>,
    /// Records with no authored object to update.
    pub unmatched: Vec<NaturalKey>,
    pub omitted: Vec<(NaturalKey, String)>,
    pub dropped_relationships: Vec<DroppedRelationship>,
    pub coverage: Coverage,
    pub verification: Verification,
}

impl SyncReport {
    /// Natural keys needing attention: unmatched records and omitted pages.
    pub fn failing_keys(&self) -> Vec<&NaturalKey> {
        self.unmatched
            .iter()
            .chain(self.omitted.iter().map(|(key, _)| key))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// The synchronized store, ready to be written.
    Applied { store: Bundle, report: SyncReport },
    /// Coverage fell below the minimum; the original store stands.
    Aborted { report: SyncReport },
}

impl SyncOutcome {
    pub fn report(&self) -> &SyncReport {
        match self {
            Self::Applied { report, .. } | Self::Aborted { report } => report,
        }
    }
}

// ---------------------------------------------------------------------------
// Synchronizer
// ---------------------------------------------------------------------------

pub struct Synchronizer<'a> {
    graph: GraphBuilder<'a>,
    source_name: &'a str,
    extension_id: &'a str,
    min_coverage: f64,
}

impl<'a> Synchronizer<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self {
            graph: GraphBuilder::new(&config.identity),
            source_name: &config.identity.source_name,
            extension_id: &config.identity.extension_id,
            min_coverage: config.sync.min_coverage,
        }
    }

    #[instrument(skip_all, fields(objects = store.objects.len(), records = batch.records.len()))]
    pub fn run(
        &self,
        store: &Bundle,
        batch: &ExtractionBatch,
        relational: &RelationalData,
    ) -> Result<SyncOutcome> {
        let mut working = store.clone();

        // 1. Reset derived state.
        let before = working.objects.len();
        working.objects.retain(|obj| !is_generated(obj));
        let removed = before - working.objects.len();
        debug!(removed, "reset generated objects");

        // 2. Generated objects.
        let generated = self.generate_objects(relational)?;
        let mitigations_added = generated.mitigations;
        let detections_added = generated.detections;
        working.objects.extend(generated.objects);

        // 3. Authored field overwrite.
        let (matched, unmatched) = self.overwrite_public_fields(&mut working, &batch.records);

        // 4. Relationships.
        let (relationships_added, dropped_relationships) =
            self.rebuild_relationships(&mut working, relational)?;

        let mut expected = batch.attempted();
        expected.extend(relational.keys().cloned());
        let coverage = Coverage {
            matched: matched.len(),
            expected: expected.len(),
            minimum: self.min_coverage,
        };

        let mut report = SyncReport {
            removed,
            mitigations_added,
            detections_added,
            relationships_added,
            duplicate_declarations: generated.duplicates,
            matched,
            unmatched,
            omitted: batch
                .omitted
                .iter()
                .map(|(k, reason)| (k.clone(), reason.clone()))
                .collect(),
            dropped_relationships,
            coverage,
            verification: Verification::default(),
        };

        // 5. Coverage gate.
        if !coverage.passes() {
            warn!(
                matched = coverage.matched,
                expected = coverage.expected,
                ratio = coverage.ratio(),
                minimum = coverage.minimum,
                "coverage below minimum, discarding changes"
            );
            report.verification = self.verify(store);
            return Ok(SyncOutcome::Aborted { report });
        }

        report.verification = self.verify(&working);
        info!(
            removed,
            mitigations = mitigations_added,
            detections = detections_added,
            relationships = relationships_added,
            matched = report.matched.len(),
            unmatched = report.unmatched.len(),
            "synchronization complete"
        );
        Ok(SyncOutcome::Applied {
            store: working,
            report,
        })
    }

    fn generate_objects(&self, relational: &RelationalData) -> Result<Generated> {
        let mut out = Generated::default();
        let mut seen = HashSet::new();

        for (_, relations) in relational.iter() {
            for entry in &relations.mitigations {
                let obj = self.graph.mitigation(entry)?;
                if seen.insert(obj.id().to_string()) {
                    out.objects.push(obj);
                    out.mitigations += 1;
                } else {
                    out.duplicates += 1;
                }
            }
            for entry in &relations.detections {
                let obj = self.graph.detection(entry)?;
                if seen.insert(obj.id().to_string()) {
                    out.objects.push(obj);
                    out.detections += 1;
                } else {
                    out.duplicates += 1;
                }
            }
        }
        Ok(out)
    }

    fn overwrite_public_fields(
        &self,
        working: &mut Bundle,
        records: &BTreeMap<NaturalKey, PublicRecord>,
    ) -> (Vec<NaturalKey>, Vec<NaturalKey>) {
        let authored: HashMap<String, usize> = working
            .objects
            .iter()
            .enumerate()
            .filter(|(_, obj)| {
                matches!(obj.category(), Some(Category::Technique | Category::Tactic))
            })
            .filter_map(|(pos, obj)| Some((obj.natural_key(self.source_name)?.to_string(), pos)))
            .collect();

        let mut matched = Vec::new();
        let mut unmatched = Vec::new();
        for (key, record) in records {
            match authored.get(key.as_str()) {
                Some(&pos) => {
                    write_public_record(&mut working.objects[pos], self.extension_id, record);
                    matched.push(key.clone());
                }
                None => {
                    debug!(%key, "no authored object for record");
                    unmatched.push(key.clone());
                }
            }
        }
        (matched, unmatched)
    }

    fn rebuild_relationships(
        &self,
        working: &mut Bundle,
        relational: &RelationalData,
    ) -> Result<(usize, Vec<DroppedRelationship>)> {
        let ids: HashSet<String> = working.objects.iter().map(|o| o.id().to_string()).collect();
        let techniques: HashMap<String, String> = working
            .of_category(Category::Technique)
            .filter_map(|obj| {
                Some((
                    obj.natural_key(self.source_name)?.to_string(),
                    obj.id().to_string(),
                ))
            })
            .collect();

        let mut dropped = Vec::new();
        let mut tuples: HashSet<(String, String, String)> = HashSet::new();

        // Authored relationships survive the reset; check they still resolve.
        working.objects.retain(|obj| {
            if !obj.is_relationship() {
                return true;
            }
            let (source, target) = (obj.source_ref().unwrap_or(""), obj.target_ref().unwrap_or(""));
            let rel = obj.relationship_type().unwrap_or("");
            let reason = if !ids.contains(source) {
                Some("source does not resolve")
            } else if !ids.contains(target) {
                Some("target does not resolve")
            } else if !tuples.insert((source.into(), rel.into(), target.into())) {
                Some("duplicate")
            } else {
                None
            };
            match reason {
                Some(reason) => {
                    dropped.push(DroppedRelationship {
                        source: source.into(),
                        relationship_type: rel.into(),
                        target: target.into(),
                        reason: reason.into(),
                    });
                    false
                }
                None => true,
            }
        });

        let mut added = Vec::new();
        for (technique_key, relations) in relational.iter() {
            let edges = relations
                .mitigations
                .iter()
                .map(|e| (e, Category::Mitigation, RelationshipType::Mitigates))
                .chain(
                    relations
                        .detections
                        .iter()
                        .map(|e| (e, Category::DetectionIndicator, RelationshipType::Indicates)),
                );

            for (entry, category, rel) in edges {
                let Some(target_ref) = techniques.get(technique_key.as_str()) else {
                    dropped.push(dangling(entry, rel, technique_key));
                    continue;
                };
                let source_ref = self.graph.identity().assign(category, &entry.id);
                if !tuples.insert((source_ref.clone(), rel.as_str().into(), target_ref.clone())) {
                    debug!(source = %entry.id, %rel, target = %technique_key, "duplicate relationship");
                    continue;
                }
                added.push(self.graph.relationship(
                    rel,
                    (entry.id.as_str(), source_ref.as_str()),
                    (technique_key.as_str(), target_ref.as_str()),
                    &entry.name,
                )?);
            }
        }

        for rel in &dropped {
            warn!(%rel, "dropped relationship");
        }
        let count = added.len();
        working.objects.extend(added);
        Ok((count, dropped))
    }

    fn verify(&self, store: &Bundle) -> Verification {
        let mut verification = Verification::default();
        for obj in store.of_category(Category::Technique) {
            verification.techniques += 1;
            let titled = obj
                .extension(self.extension_id)
                .and_then(|ext| ext.get(fields::PUBLIC_TITLE))
                .and_then(|v| v.as_str())
                .is_some_and(|t| !t.is_empty());
            if titled {
                verification.with_public_title += 1;
            } else if let Some(key) = obj.natural_key(self.source_name) {
                verification.missing.push(NaturalKey::from(key));
            }
        }
        verification
    }
}

#[derive(Default)]
struct Generated {
    objects: Vec<StixObject>,
    mitigations: usize,
    detections: usize,
    duplicates: usize,
}

/// Generated categories and generated relationship types.
fn is_generated(obj: &StixObject) -> bool {
    if obj.is_relationship() {
        return obj
            .relationship_type()
            .and_then(RelationshipType::parse)
            .is_some_and(RelationshipType::is_generated);
    }
    obj.category().is_some_and(Category::is_generated)
}

fn dangling(entry: &CatalogueEntry, rel: RelationshipType, target: &NaturalKey) -> DroppedRelationship {
    DroppedRelationship {
        source: entry.id.clone(),
        relationship_type: rel.as_str().into(),
        target: target.to_string(),
        reason: "technique not in store".into(),
    }
}
