//! Extraction export and the extract → synchronize → write job.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tfasync_extract::{Extraction, extract};
use tfasync_shared::{AppConfig, NaturalKey, PublicRecord, Result};
use tfasync_store::{
    Bundle, ExtractionBatch, RelationalData, SyncOutcome, SyncReport, Synchronizer, WriteOutcome,
    catalogue_csv, catalogue_rows, guarded_write, write_atomic,
};
use tracing::{debug, info, instrument, warn};

use crate::discovery::extraction_pages;
use crate::pipeline::ProgressReporter;

/// What one extraction pass saw.
#[derive(Debug, Clone, Default)]
pub struct ExtractSummary {
    pub batch: ExtractionBatch,
    /// Pages read, keyed or not.
    pub documents: usize,
    /// Pages without a natural key; excluded from all counts.
    pub unkeyed: Vec<PathBuf>,
    /// Pages that could not be read.
    pub failed: Vec<(PathBuf, String)>,
}

/// Run the extractor over every extractable page.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn extract_documents(
    root: &Path,
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> ExtractSummary {
    let pages = extraction_pages(root, &config.documents);
    let total = pages.len();
    let mut summary = ExtractSummary::default();

    for (i, page) in pages.iter().enumerate() {
        progress.document(&page.path.display().to_string(), i + 1, total);
        let text = match std::fs::read_to_string(&page.path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %page.path.display(), error = %e, "cannot read page");
                summary.failed.push((page.path.clone(), e.to_string()));
                continue;
            }
        };
        summary.documents += 1;

        match extract(&text) {
            Extraction::Record { key, record } => {
                debug!(%key, "record extracted");
                summary.batch.omitted.remove(&key);
                summary.batch.records.insert(key, record);
            }
            Extraction::Omitted { key, reason } => {
                warn!(%key, %reason, path = %page.path.display(), "page omitted");
                if !summary.batch.records.contains_key(&key) {
                    summary.batch.omitted.insert(key, reason.to_string());
                }
            }
            Extraction::Unkeyed => {
                debug!(path = %page.path.display(), "page has no natural key");
                summary.unkeyed.push(page.path.clone());
            }
        }
    }

    info!(
        documents = summary.documents,
        records = summary.batch.records.len(),
        omitted = summary.batch.omitted.len(),
        unkeyed = summary.unkeyed.len(),
        "extraction complete"
    );
    summary
}

#[derive(Debug, Clone)]
pub struct ExportResult {
    pub summary: ExtractSummary,
    pub output: PathBuf,
}

/// Extract and write the records as a sorted JSON map. The store is not touched.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn export_extractions(
    root: &Path,
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> Result<ExportResult> {
    progress.phase("Extracting public content");
    let summary = extract_documents(root, config, progress);

    let records: &BTreeMap<NaturalKey, PublicRecord> = &summary.batch.records;
    let mut json = serde_json::to_string_pretty(records)?;
    json.push('\n');

    let output = root.join(&config.store.extractions_output);
    write_atomic(&output, json.as_bytes())?;
    info!(output = %output.display(), records = records.len(), "extractions written");

    Ok(ExportResult { summary, output })
}

/// The mitigation/detection CSV written after a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueExport {
    pub path: PathBuf,
    pub mitigations: usize,
    pub detections: usize,
}

#[derive(Debug, Clone)]
pub struct SyncJobResult {
    pub extraction: ExtractSummary,
    pub report: SyncReport,
    /// The coverage gate discarded every change.
    pub aborted: bool,
    /// `None` when aborted.
    pub write: Option<WriteOutcome>,
    /// `None` when aborted or when no CSV output is configured.
    pub catalogue: Option<CatalogueExport>,
}

/// Extract, synchronize, and write the store behind the backup guard.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn sync_store(
    root: &Path,
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> Result<SyncJobResult> {
    progress.phase("Loading store");
    let store_path = root.join(&config.store.path);
    let store = Bundle::load(&store_path)?;
    let relational = RelationalData::load(&root.join(&config.store.relational_data))?;

    progress.phase("Extracting public content");
    let extraction = extract_documents(root, config, progress);

    progress.phase("Synchronizing store");
    let outcome = Synchronizer::new(config).run(&store, &extraction.batch, &relational)?;

    match outcome {
        SyncOutcome::Applied { store, report } => {
            progress.phase("Writing store");
            let json = store.to_json()?;
            let write = guarded_write(&store_path, &config.store.backup_suffix, &json)?;
            let catalogue = match &config.store.csv_output {
                Some(output) => Some(export_catalogue(
                    &root.join(output),
                    &store,
                    &relational,
                    config,
                )?),
                None => None,
            };
            Ok(SyncJobResult {
                extraction,
                report,
                aborted: false,
                write: Some(write),
                catalogue,
            })
        }
        SyncOutcome::Aborted { report } => {
            warn!(path = %store_path.display(), "store left untouched");
            Ok(SyncJobResult {
                extraction,
                report,
                aborted: true,
                write: None,
                catalogue: None,
            })
        }
    }
}

fn export_catalogue(
    path: &Path,
    store: &Bundle,
    relational: &RelationalData,
    config: &AppConfig,
) -> Result<CatalogueExport> {
    let rows = catalogue_rows(store, relational, &config.identity.source_name);
    let csv = catalogue_csv(&rows)?;
    write_atomic(path, csv.as_bytes())?;

    let mitigations = rows.iter().filter(|r| r.is_mitigation()).count();
    let export = CatalogueExport {
        path: path.to_path_buf(),
        mitigations,
        detections: rows.len() - mitigations,
    };
    info!(
        output = %path.display(),
        mitigations = export.mitigations,
        detections = export.detections,
        "catalogue CSV written"
    );
    Ok(export)
}
