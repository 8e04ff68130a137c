//! Deterministic identifiers.
//!
//! `<type>--<uuid>` where the UUID is v5 in the DNS namespace over
//! `<namespace><seed>`. Same seed, same identifier, on every run.

use tfasync_shared::{Category, IdentityConfig, RelationshipType};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Identity {
    namespace: String,
}

impl Identity {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(config.namespace.clone())
    }

    pub fn uuid(&self, seed: &str) -> Uuid {
        let name = format!("{}{seed}", self.namespace);
        Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes())
    }

    /// Identifier of a domain object seeded by its natural key.
    pub fn assign(&self, category: Category, seed: &str) -> String {
        format!("{}--{}", category.stix_type(), self.uuid(seed))
    }

    /// Identifier of the edge `source --rel--> target`, seeded by natural keys.
    pub fn relationship_id(&self, source: &str, rel: RelationshipType, target: &str) -> String {
        let seed = format!("{source}-{}-{target}", rel.as_str());
        format!("relationship--{}", self.uuid(&seed))
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::from_config(&IdentityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_is_pure_and_namespaced() {
        let id = Identity::default();
        assert_eq!(
            id.assign(Category::Mitigation, "M-1"),
            "course-of-action--8e7bf54c-b34e-5dd7-a2e3-a5184d94dead"
        );
        assert_eq!(
            id.assign(Category::DetectionIndicator, "D-1"),
            "indicator--9bc4b91f-2d67-512f-8f84-618001f82d07"
        );
        assert_eq!(
            id.assign(Category::Mitigation, "M-1"),
            Identity::default().assign(Category::Mitigation, "M-1")
        );
    }

    #[test]
    fn relationship_seed_joins_keys_and_type() {
        let id = Identity::default();
        assert_eq!(
            id.relationship_id("M-1", RelationshipType::Mitigates, "T-1001"),
            "relationship--5ed1621b-fb18-5633-8f78-895b7f1f0d7d"
        );
        assert_eq!(
            id.relationship_id("D-1", RelationshipType::Indicates, "T-1001"),
            "relationship--6566f1cb-021b-5273-a59f-78ca9cf6a651"
        );
    }

    #[test]
    fn different_seeds_differ() {
        let id = Identity::default();
        assert_ne!(id.uuid("M-1"), id.uuid("M-2"));
        assert_ne!(Identity::new("other.").uuid("M-1"), id.uuid("M-1"));
    }
}
