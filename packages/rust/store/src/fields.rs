//! Public extension fields on authored objects.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use tfasync_shared::{Category, NaturalKey, PublicRecord, SafetyAction, Signal};

use crate::bundle::{Bundle, StixObject};

pub const PUBLIC_TITLE: &str = "x_tfa_public_title";
pub const PUBLIC_SUMMARY: &str = "x_tfa_public_summary";
pub const SAFETY_WARNING: &str = "x_tfa_public_safety_warning";
pub const RECOGNITION_SIGNALS: &str = "x_tfa_recognition_signals";
pub const SAFETY_ACTIONS: &str = "x_tfa_safety_actions";

/// Overwrite the public fields of `obj` with `record`.
///
/// Other keys inside the extension are left alone. The warning key is removed
/// when the record has none, so a withdrawn warning does not linger.
pub fn write_public_record(obj: &mut StixObject, extension_id: &str, record: &PublicRecord) {
    let ext = obj.extension_mut(extension_id);
    ext.insert(PUBLIC_TITLE.into(), json!(record.title));
    ext.insert(PUBLIC_SUMMARY.into(), json!(record.summary));
    match &record.safety_warning {
        Some(warning) => {
            ext.insert(SAFETY_WARNING.into(), json!(warning));
        }
        None => {
            ext.shift_remove(SAFETY_WARNING);
        }
    }
    ext.insert(RECOGNITION_SIGNALS.into(), json!(record.signals));
    ext.insert(SAFETY_ACTIONS.into(), json!(record.actions));
}

/// Read the public fields back; missing fields come back empty.
pub fn read_public_record(obj: &StixObject, extension_id: &str) -> PublicRecord {
    let Some(ext) = obj.extension(extension_id) else {
        return PublicRecord::default();
    };
    let text = |key: &str| ext.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
    let list = |key: &str| ext.get(key).cloned().unwrap_or(Value::Array(Vec::new()));

    PublicRecord {
        title: text(PUBLIC_TITLE),
        summary: text(PUBLIC_SUMMARY),
        safety_warning: ext
            .get(SAFETY_WARNING)
            .and_then(Value::as_str)
            .filter(|w| !w.is_empty())
            .map(str::to_string),
        signals: serde_json::from_value::<Vec<Signal>>(list(RECOGNITION_SIGNALS)).unwrap_or_default(),
        actions: serde_json::from_value::<Vec<SafetyAction>>(list(SAFETY_ACTIONS)).unwrap_or_default(),
    }
}

/// What a page needs to render its public view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicView {
    /// Core (technical) display name.
    pub name: String,
    pub record: PublicRecord,
}

impl PublicView {
    /// The public title, or the technical name when no public title exists.
    pub fn display_title(&self) -> &str {
        if self.record.title.is_empty() {
            &self.name
        } else {
            &self.record.title
        }
    }
}

/// Public views of every object in `category`, keyed by natural key.
pub fn public_views(
    bundle: &Bundle,
    category: Category,
    source_name: &str,
    extension_id: &str,
) -> BTreeMap<NaturalKey, PublicView> {
    bundle
        .of_category(category)
        .filter_map(|obj| {
            let key = obj.natural_key(source_name)?;
            Some((
                NaturalKey::from(key),
                PublicView {
                    name: obj.name().to_string(),
                    record: read_public_record(obj, extension_id),
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXT: &str = "extension-definition--x";

    fn object() -> StixObject {
        StixObject::from_value(json!({
            "type": "attack-pattern",
            "id": "attack-pattern--1",
            "name": "Technical Name",
            "description": "Core description",
            "external_references": [{"source_name": "src", "external_id": "T-1001"}],
            "extensions": {EXT: {"extension_type": "property-extension", "x_tfa_version": "1.0",
                "x_tfa_public_safety_warning": "Old warning"}}
        }))
        .unwrap()
    }

    fn record() -> PublicRecord {
        PublicRecord {
            title: "Example".into(),
            summary: String::new(),
            safety_warning: None,
            signals: vec![Signal {
                title: "Odd logins".into(),
                explanation: "New device.".into(),
            }],
            actions: vec![],
        }
    }

    #[test]
    fn write_overwrites_fields_and_keeps_core() {
        let mut obj = object();
        write_public_record(&mut obj, EXT, &record());

        let ext = obj.extension(EXT).unwrap();
        assert_eq!(ext[PUBLIC_TITLE], "Example");
        assert_eq!(ext["x_tfa_version"], "1.0");
        assert!(ext.get(SAFETY_WARNING).is_none());
        assert_eq!(ext[SAFETY_ACTIONS], json!([]));
        assert_eq!(obj.name(), "Technical Name");
        assert_eq!(obj.str_prop("description"), Some("Core description"));
    }

    #[test]
    fn read_returns_what_was_written() {
        let mut obj = object();
        write_public_record(&mut obj, EXT, &record());
        assert_eq!(read_public_record(&obj, EXT), record());
    }

    #[test]
    fn display_title_falls_back_to_name() {
        let bundle = Bundle {
            kind: "bundle".into(),
            id: "bundle--1".into(),
            extra: Default::default(),
            objects: vec![object()],
        };
        let views = public_views(&bundle, Category::Technique, "src", EXT);
        let view = &views[&NaturalKey::from("T-1001")];
        assert_eq!(view.display_title(), "Technical Name");
        assert_eq!(view.record.safety_warning.as_deref(), Some("Old warning"));
    }
}
