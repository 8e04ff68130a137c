//! Core domain types shared by the extractor, store and injectors.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NaturalKey
// ---------------------------------------------------------------------------

/// A human-meaningful catalogue code such as `TFA-T-1001`.
///
/// Natural keys seed deterministic identifiers and join extracted records to
/// authored objects in the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NaturalKey(pub String);

impl NaturalKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NaturalKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Domain object categories and their STIX type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Technique,
    Tactic,
    Mitigation,
    DetectionIndicator,
}

impl Category {
    /// STIX `type` tag for this category.
    pub fn stix_type(self) -> &'static str {
        match self {
            Self::Technique => "attack-pattern",
            Self::Tactic => "x-mitre-tactic",
            Self::Mitigation => "course-of-action",
            Self::DetectionIndicator => "indicator",
        }
    }

    /// Reverse of [`Category::stix_type`]. Unknown tags yield `None`.
    pub fn from_stix_type(tag: &str) -> Option<Self> {
        match tag {
            "attack-pattern" => Some(Self::Technique),
            "x-mitre-tactic" => Some(Self::Tactic),
            "course-of-action" => Some(Self::Mitigation),
            "indicator" => Some(Self::DetectionIndicator),
            _ => None,
        }
    }

    /// Generated categories are rebuilt wholesale on every sync; authored
    /// ones are only ever updated in place.
    pub fn is_generated(self) -> bool {
        matches!(self, Self::Mitigation | Self::DetectionIndicator)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.stix_type())
    }
}

// ---------------------------------------------------------------------------
// RelationshipType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationshipType {
    /// Mitigation -> Technique.
    Mitigates,
    /// DetectionIndicator -> Technique.
    Indicates,
    /// Legacy spelling of `indicates`; removed on reset, never written.
    Detects,
    /// Authored cross-reference, preserved across syncs.
    RelatedTo,
}

impl RelationshipType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mitigates => "mitigates",
            Self::Indicates => "indicates",
            Self::Detects => "detects",
            Self::RelatedTo => "related-to",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mitigates" => Some(Self::Mitigates),
            "indicates" => Some(Self::Indicates),
            "detects" => Some(Self::Detects),
            "related-to" => Some(Self::RelatedTo),
            _ => None,
        }
    }

    /// Whether relationships of this type are derived from relational data.
    pub fn is_generated(self) -> bool {
        !matches!(self, Self::RelatedTo)
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PageKind
// ---------------------------------------------------------------------------

/// Presentation page layouts the injectors know how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Technique,
    Tactic,
    Matrix,
}

impl std::fmt::Display for PageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Technique => "technique",
            Self::Tactic => "tactic",
            Self::Matrix => "matrix",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// PublicRecord
// ---------------------------------------------------------------------------

/// A recognition signal: something a person might notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub title: String,
    pub explanation: String,
}

/// A safety action with an optional caution attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyAction {
    pub title: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_note: Option<String>,
}

/// Public-facing fields pulled from a page's public view.
///
/// Only records with a non-empty title are ever constructed by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PublicRecord {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_warning: Option<String>,
    #[serde(default)]
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub actions: Vec<SafetyAction>,
}
