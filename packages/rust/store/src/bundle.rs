//! STIX 2.1 bundle model.
//!
//! Objects are kept as ordered JSON maps so properties this crate does not
//! know about survive a load/save cycle verbatim and in their original order.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tfasync_shared::{Category, Result, SyncError};

/// The canonical store file: a bundle of typed objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    /// Unknown top-level properties (e.g. `spec_version`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(default)]
    pub objects: Vec<StixObject>,
}

impl Bundle {
    /// Parse a bundle from JSON text, rejecting objects without `type`/`id`.
    pub fn from_json(text: &str) -> Result<Self> {
        let bundle: Bundle = serde_json::from_str(text)
            .map_err(|e| SyncError::parse(format!("invalid bundle JSON: {e}")))?;
        if bundle.kind != "bundle" {
            return Err(SyncError::store(format!(
                "expected type \"bundle\", found \"{}\"",
                bundle.kind
            )));
        }
        for (pos, obj) in bundle.objects.iter().enumerate() {
            if obj.kind().is_empty() || obj.id().is_empty() {
                return Err(SyncError::store(format!(
                    "object #{pos} lacks a string type or id"
                )));
            }
        }
        Ok(bundle)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
        Self::from_json(&text).map_err(|e| match e {
            SyncError::Parse { message } => SyncError::parse(format!("{}: {message}", path.display())),
            other => other,
        })
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn get(&self, id: &str) -> Option<&StixObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    /// Objects of one category, in store order.
    pub fn of_category(&self, category: Category) -> impl Iterator<Item = &StixObject> {
        self.objects
            .iter()
            .filter(move |o| o.category() == Some(category))
    }
}

/// One STIX object as an ordered property map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StixObject(Map<String, Value>);

impl StixObject {
    pub fn new(properties: Map<String, Value>) -> Self {
        Self(properties)
    }

    /// Wrap a `json!` value; non-objects are rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(SyncError::validation(format!(
                "STIX object must be a JSON object, got {other}"
            ))),
        }
    }

    pub fn kind(&self) -> &str {
        self.str_prop("type").unwrap_or_default()
    }

    pub fn id(&self) -> &str {
        self.str_prop("id").unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.str_prop("name").unwrap_or_default()
    }

    pub fn category(&self) -> Option<Category> {
        Category::from_stix_type(self.kind())
    }

    pub fn is_relationship(&self) -> bool {
        self.kind() == "relationship"
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn str_prop(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn relationship_type(&self) -> Option<&str> {
        self.str_prop("relationship_type")
    }

    pub fn source_ref(&self) -> Option<&str> {
        self.str_prop("source_ref")
    }

    pub fn target_ref(&self) -> Option<&str> {
        self.str_prop("target_ref")
    }

    /// `external_id` of the first external reference from `source_name`.
    pub fn natural_key(&self, source_name: &str) -> Option<&str> {
        self.0
            .get("external_references")?
            .as_array()?
            .iter()
            .find(|r| r.get("source_name").and_then(Value::as_str) == Some(source_name))?
            .get("external_id")?
            .as_str()
    }

    pub fn extension(&self, extension_id: &str) -> Option<&Map<String, Value>> {
        self.0.get("extensions")?.get(extension_id)?.as_object()
    }

    /// The property-extension map for `extension_id`, created if absent.
    pub fn extension_mut(&mut self, extension_id: &str) -> &mut Map<String, Value> {
        let extensions = ensure_object(
            self.0
                .entry("extensions")
                .or_insert_with(|| Value::Object(Map::new())),
        );
        let extension = ensure_object(
            extensions
                .entry(extension_id)
                .or_insert_with(|| Value::Object(Map::new())),
        );
        extension
            .entry("extension_type")
            .or_insert_with(|| Value::String("property-extension".into()));
        extension
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SOURCE: &str = "not-a-standard-tfa";
    const EXT: &str = "extension-definition--acf2f380-0000-4000-8000-000000000001";

    fn technique() -> StixObject {
        StixObject::from_value(json!({
            "type": "attack-pattern",
            "id": "attack-pattern--1",
            "name": "Account Takeover",
            "x_custom": {"keep": true},
            "external_references": [
                {"source_name": "other", "external_id": "X-1"},
                {"source_name": SOURCE, "external_id": "TFA-T-1001"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn natural_key_uses_configured_source() {
        let obj = technique();
        assert_eq!(obj.natural_key(SOURCE), Some("TFA-T-1001"));
        assert_eq!(obj.natural_key("missing"), None);
        assert_eq!(obj.category(), Some(Category::Technique));
    }

    #[test]
    fn extension_mut_creates_property_extension() {
        let mut obj = technique();
        obj.extension_mut(EXT).insert("x_tfa_public_title".into(), json!("Public"));
        let ext = obj.extension(EXT).unwrap();
        assert_eq!(ext["extension_type"], "property-extension");
        assert_eq!(ext["x_tfa_public_title"], "Public");
    }

    #[test]
    fn unknown_properties_survive_roundtrip_in_order() {
        let text = r#"{
  "type": "bundle",
  "id": "bundle--1",
  "spec_version": "2.1",
  "objects": [
    {"type": "identity", "id": "identity--1", "zeta": 1, "alpha": 2}
  ]
}"#;
        let bundle = Bundle::from_json(text).unwrap();
        let json = bundle.to_json().unwrap();
        assert!(json.contains("\"spec_version\": \"2.1\""));
        let zeta = json.find("zeta").unwrap();
        let alpha = json.find("alpha").unwrap();
        assert!(zeta < alpha);
        assert_eq!(Bundle::from_json(&json).unwrap(), bundle);
    }

    #[test]
    fn rejects_objects_without_id() {
        let text = r#"{"type": "bundle", "id": "bundle--1", "objects": [{"type": "indicator"}]}"#;
        let err = Bundle::from_json(text).unwrap_err();
        assert!(matches!(err, SyncError::Store { .. }));
        assert!(err.to_string().starts_with("store error: object #0"));
    }

    #[test]
    fn rejects_non_bundle_document() {
        let text = r#"{"type": "indicator", "id": "indicator--1"}"#;
        let err = Bundle::from_json(text).unwrap_err();
        assert!(matches!(err, SyncError::Store { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Bundle::from_json("{not json").unwrap_err();
        assert!(matches!(err, SyncError::Parse { .. }));
    }
}
