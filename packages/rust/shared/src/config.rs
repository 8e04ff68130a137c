//! Application configuration for tfasync.
//!
//! The config file lives at `<root>/tfasync.toml`, beside the document tree
//! it describes. Every field has a default, so a missing file yields the
//! built-in layout and the batch jobs stay argument-free.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Config file name, resolved relative to the document root.
pub const CONFIG_FILE_NAME: &str = "tfasync.toml";

// ---------------------------------------------------------------------------
// Config structs (matching tfasync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Canonical store locations.
    #[serde(default)]
    pub store: StoreConfig,

    /// Identifier and STIX envelope settings for generated objects.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Synchronizer policy.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Document tree layout.
    #[serde(default)]
    pub documents: DocumentsConfig,
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Canonical store file, relative to the root.
    #[serde(default = "default_store_path")]
    pub path: String,

    /// Suffix appended to the store's file stem to name the backup.
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,

    /// Authoritative relational data (mitigations/detections per technique).
    #[serde(default = "default_relational_data")]
    pub relational_data: String,

    /// Output of the `extract` job.
    #[serde(default = "default_extractions_output")]
    pub extractions_output: String,

    /// CSV listing of every mitigation and detection, written after a
    /// successful sync. Not written when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_output: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            backup_suffix: default_backup_suffix(),
            relational_data: default_relational_data(),
            extractions_output: default_extractions_output(),
            csv_output: None,
        }
    }
}

fn default_store_path() -> String {
    "stix/tfa-attack.json".into()
}
fn default_backup_suffix() -> String {
    "-pre-sync".into()
}
fn default_relational_data() -> String {
    "data/technique_data.json".into()
}
fn default_extractions_output() -> String {
    "public_extractions.json".into()
}

/// `[identity]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Prefix prepended to every seed before hashing.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// `source_name` of the external reference carrying natural keys.
    #[serde(default = "default_source_name")]
    pub source_name: String,

    /// Key of the property-extension holding the public fields.
    #[serde(default = "default_extension_id")]
    pub extension_id: String,

    /// `created_by_ref` stamped on generated objects.
    #[serde(default = "default_identity_ref")]
    pub identity_ref: String,

    /// Marking definition stamped on generated objects.
    #[serde(default = "default_marking_ref")]
    pub marking_ref: String,

    /// Base URL for generated external references.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// STIX spec version of generated objects.
    #[serde(default = "default_spec_version")]
    pub spec_version: String,

    /// Timestamp used for `created`/`modified`/`valid_from` of generated objects.
    #[serde(default = "default_created")]
    pub created: DateTime<Utc>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            source_name: default_source_name(),
            extension_id: default_extension_id(),
            identity_ref: default_identity_ref(),
            marking_ref: default_marking_ref(),
            base_url: default_base_url(),
            spec_version: default_spec_version(),
            created: default_created(),
        }
    }
}

impl IdentityConfig {
    /// `created` rendered the way STIX timestamps appear in the store.
    pub fn timestamp(&self) -> String {
        self.created.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }
}

fn default_namespace() -> String {
    "tfa-matrix.org.".into()
}
fn default_source_name() -> String {
    "not-a-standard-tfa".into()
}
fn default_extension_id() -> String {
    "extension-definition--acf2f380-0000-4000-8000-000000000001".into()
}
fn default_identity_ref() -> String {
    "identity--f1b2c3d4-e5f6-7890-abcd-ef1234567890".into()
}
fn default_marking_ref() -> String {
    "marking-definition--a1b2c3d4-1234-5678-9abc-def012345678".into()
}
fn default_base_url() -> String {
    "https://notastandard.ai/tfa-matrix".into()
}
fn default_spec_version() -> String {
    "2.1".into()
}
fn default_created() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 4, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// `[sync]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Minimum fraction of expected documents that must yield a matched
    /// record before the store may be rewritten.
    #[serde(default = "default_min_coverage")]
    pub min_coverage: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            min_coverage: default_min_coverage(),
        }
    }
}

fn default_min_coverage() -> f64 {
    0.95
}

/// `[documents]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// Directories holding one `<key>/index.html` per technique.
    #[serde(default = "default_technique_dirs")]
    pub technique_dirs: Vec<String>,

    /// Directories holding one `<key>/index.html` per tactic.
    #[serde(default = "default_tactic_dirs")]
    pub tactic_dirs: Vec<String>,

    /// Matrix overview pages.
    #[serde(default = "default_matrix_pages")]
    pub matrix_pages: Vec<String>,

    /// Directories the extractor reads from.
    #[serde(default = "default_extract_dirs")]
    pub extract_dirs: Vec<String>,

    /// Directory-name prefix of technique pages.
    #[serde(default = "default_technique_prefix")]
    pub technique_prefix: String,

    /// Directory-name prefix of tactic pages.
    #[serde(default = "default_tactic_prefix")]
    pub tactic_prefix: String,

    /// Directory names never descended into (dot-dirs are always skipped).
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            technique_dirs: default_technique_dirs(),
            tactic_dirs: default_tactic_dirs(),
            matrix_pages: default_matrix_pages(),
            extract_dirs: default_extract_dirs(),
            technique_prefix: default_technique_prefix(),
            tactic_prefix: default_tactic_prefix(),
            skip_dirs: default_skip_dirs(),
        }
    }
}

fn default_technique_dirs() -> Vec<String> {
    vec!["techniques".into(), "output/techniques".into()]
}
fn default_tactic_dirs() -> Vec<String> {
    vec!["tactics".into(), "output/tactics".into()]
}
fn default_matrix_pages() -> Vec<String> {
    vec![
        "matrices/tfa/index.html".into(),
        "output/matrices/tfa/index.html".into(),
    ]
}
fn default_extract_dirs() -> Vec<String> {
    vec!["techniques".into()]
}
fn default_technique_prefix() -> String {
    "TFA-T-".into()
}
fn default_tactic_prefix() -> String {
    "TFA-TA-".into()
}
fn default_skip_dirs() -> Vec<String> {
    vec!["node_modules".into(), "__pycache__".into()]
}

impl AppConfig {
    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        let coverage = self.sync.min_coverage;
        if !(0.0..=1.0).contains(&coverage) {
            return Err(SyncError::config(format!(
                "sync.min_coverage must be within [0, 1], got {coverage}"
            )));
        }
        if self.identity.source_name.trim().is_empty() {
            return Err(SyncError::config("identity.source_name must not be empty"));
        }
        if self.identity.extension_id.trim().is_empty() {
            return Err(SyncError::config("identity.extension_id must not be empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path of the config file for a document root.
pub fn config_file_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load the config for a document root. Returns defaults if the file does not exist.
pub fn load_config(root: &Path) -> Result<AppConfig> {
    let path = config_file_path(root);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load and validate the config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| SyncError::config(format!("failed to parse {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

/// Write a default config file into the document root.
/// Returns the path to the created file.
pub fn init_config(root: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root).map_err(|e| SyncError::io(root, e))?;

    let path = config_file_path(root);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| SyncError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SyncError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
