//! Shared types, error model, configuration, and the document marker contract.
//!
//! This crate is the foundation depended on by all other tfasync crates.
//! It provides:
//! - [`SyncError`] — the unified error type
//! - Domain types ([`Category`], [`NaturalKey`], [`PublicRecord`], [`PageKind`])
//! - Configuration ([`AppConfig`], config loading)
//! - [`markers`] — literal strings shared by the extractor and the injectors

pub mod config;
pub mod error;
pub mod markers;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DocumentsConfig, IdentityConfig, StoreConfig, SyncConfig, CONFIG_FILE_NAME,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, SyncError};
pub use types::{
    Category, NaturalKey, PageKind, PublicRecord, RelationshipType, SafetyAction, Signal,
};
