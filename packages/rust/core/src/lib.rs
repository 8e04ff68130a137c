//! Batch jobs for tfasync.
//!
//! This crate ties together discovery, extraction, synchronization and the
//! document injectors into the argument-free jobs the CLI exposes.

pub mod discovery;
pub mod inject;
pub mod pipeline;
pub mod sync;

pub use discovery::{Page, extraction_pages, html_files, stage_pages};
pub use inject::{FileResult, FileStatus, InjectReport, StageData};
pub use pipeline::{ProgressReporter, RunResult, SilentProgress, run_pipeline};
pub use sync::{CatalogueExport, ExportResult, ExtractSummary, SyncJobResult, export_extractions, extract_documents, sync_store};
