//! Canonical STIX store: model, deterministic identity, synchronization,
//! and the backup guard around every rewrite.

pub mod backup;
pub mod bundle;
pub mod catalogue;
pub mod fields;
pub mod graph;
pub mod identity;
pub mod relational;
pub mod sync;

pub use backup::{WriteOutcome, backup_path, digest, guarded_write, write_atomic};
pub use bundle::{Bundle, StixObject};
pub use catalogue::{CatalogueRow, catalogue_csv, catalogue_rows};
pub use fields::{PublicView, public_views, read_public_record, write_public_record};
pub use graph::GraphBuilder;
pub use identity::Identity;
pub use relational::{CatalogueEntry, RelationalData, TechniqueRelations};
pub use sync::{
    Coverage, DroppedRelationship, ExtractionBatch, SyncOutcome, SyncReport, Synchronizer,
    Verification,
};
