//! Construction of generated objects and relationships.

use serde_json::json;
use tfasync_shared::{Category, IdentityConfig, RelationshipType, Result};

use crate::bundle::StixObject;
use crate::identity::Identity;
use crate::relational::CatalogueEntry;

/// Builds generated STIX objects with deterministic ids and timestamps.
pub struct GraphBuilder<'a> {
    identity: Identity,
    config: &'a IdentityConfig,
    timestamp: String,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(config: &'a IdentityConfig) -> Self {
        Self {
            identity: Identity::from_config(config),
            timestamp: config.timestamp(),
            config,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// A `course-of-action` for one mitigation.
    pub fn mitigation(&self, entry: &CatalogueEntry) -> Result<StixObject> {
        let cfg = self.config;
        StixObject::from_value(json!({
            "type": Category::Mitigation.stix_type(),
            "spec_version": cfg.spec_version,
            "id": self.identity.assign(Category::Mitigation, &entry.id),
            "created_by_ref": cfg.identity_ref,
            "created": self.timestamp,
            "modified": self.timestamp,
            "name": entry.name,
            "description": entry.description,
            "external_references": [{
                "source_name": cfg.source_name,
                "external_id": entry.id,
                "url": format!("{}/mitigations/{}", cfg.base_url, entry.id),
            }],
            "object_marking_refs": [cfg.marking_ref],
            "extensions": {
                cfg.extension_id.as_str(): {
                    "extension_type": "property-extension",
                    "x_tfa_mitigation_id": entry.id,
                    "x_tfa_version": "1.0",
                }
            }
        }))
    }

    /// An `indicator` for one behavioural detection signal.
    pub fn detection(&self, entry: &CatalogueEntry) -> Result<StixObject> {
        let cfg = self.config;
        StixObject::from_value(json!({
            "type": Category::DetectionIndicator.stix_type(),
            "spec_version": cfg.spec_version,
            "id": self.identity.assign(Category::DetectionIndicator, &entry.id),
            "created_by_ref": cfg.identity_ref,
            "created": self.timestamp,
            "modified": self.timestamp,
            "name": entry.name,
            "description": entry.description,
            "indicator_types": ["anomalous-activity"],
            "pattern": format!("[x-tfa-behavioral:description = '{}']", entry.id),
            "pattern_type": "stix",
            "valid_from": self.timestamp,
            "external_references": [{
                "source_name": cfg.source_name,
                "external_id": entry.id,
                "url": format!("{}/detections/{}", cfg.base_url, entry.id),
            }],
            "object_marking_refs": [cfg.marking_ref],
            "extensions": {
                cfg.extension_id.as_str(): {
                    "extension_type": "property-extension",
                    "x_tfa_detection_id": entry.id,
                    "x_tfa_signal_type": "behavioral",
                    "x_tfa_version": "1.0",
                }
            }
        }))
    }

    /// A relationship between two resolved objects.
    ///
    /// `source_key`/`target_key` are natural keys and seed the identifier;
    /// `source_label` only feeds the human-readable description.
    pub fn relationship(
        &self,
        rel: RelationshipType,
        (source_key, source_ref): (&str, &str),
        (target_key, target_ref): (&str, &str),
        source_label: &str,
    ) -> Result<StixObject> {
        let cfg = self.config;
        StixObject::from_value(json!({
            "type": "relationship",
            "spec_version": cfg.spec_version,
            "id": self.identity.relationship_id(source_key, rel, target_key),
            "created_by_ref": cfg.identity_ref,
            "created": self.timestamp,
            "modified": self.timestamp,
            "relationship_type": rel.as_str(),
            "description": format!("{source_label} {} {target_key}", rel.as_str()),
            "source_ref": source_ref,
            "target_ref": target_ref,
            "object_marking_refs": [cfg.marking_ref],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> CatalogueEntry {
        CatalogueEntry {
            id: id.into(),
            name: format!("{id} name"),
            description: "desc".into(),
        }
    }

    #[test]
    fn mitigation_is_deterministic() {
        let config = IdentityConfig::default();
        let graph = GraphBuilder::new(&config);
        let a = graph.mitigation(&entry("M-1")).unwrap();
        let b = GraphBuilder::new(&config).mitigation(&entry("M-1")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.id(), "course-of-action--8e7bf54c-b34e-5dd7-a2e3-a5184d94dead");
        assert_eq!(a.str_prop("modified"), Some("2026-02-04T00:00:00.000Z"));
        assert_eq!(a.natural_key(&config.source_name), Some("M-1"));
    }

    #[test]
    fn detection_carries_pattern() {
        let config = IdentityConfig::default();
        let det = GraphBuilder::new(&config).detection(&entry("D-1")).unwrap();
        assert_eq!(det.kind(), "indicator");
        assert_eq!(det.str_prop("pattern"), Some("[x-tfa-behavioral:description = 'D-1']"));
        assert_eq!(det.str_prop("valid_from"), Some("2026-02-04T00:00:00.000Z"));
    }

    #[test]
    fn relationship_links_refs() {
        let config = IdentityConfig::default();
        let rel = GraphBuilder::new(&config)
            .relationship(
                RelationshipType::Mitigates,
                ("M-1", "course-of-action--a"),
                ("T-1001", "attack-pattern--b"),
                "Lock screen",
            )
            .unwrap();
        assert_eq!(rel.id(), "relationship--5ed1621b-fb18-5633-8f78-895b7f1f0d7d");
        assert_eq!(rel.relationship_type(), Some("mitigates"));
        assert_eq!(rel.source_ref(), Some("course-of-action--a"));
        assert_eq!(rel.str_prop("description"), Some("Lock screen mitigates T-1001"));
    }
}
