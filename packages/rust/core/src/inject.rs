//! Injection jobs: staged pages, site chrome, disclaimer refresh.
//!
//! Every page is read, transformed in memory and written back on its own;
//! a failure on one page is recorded and the job moves on.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tfasync_inject::{InjectOutcome, Stage, StageContext, chrome_injectors, inject, injector_for};
use tfasync_shared::{AppConfig, Category, NaturalKey, Result};
use tfasync_store::{Bundle, PublicView, RelationalData, public_views, write_atomic};
use tracing::{debug, info, instrument, warn};

use crate::discovery::{html_files, stage_pages};
use crate::pipeline::ProgressReporter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Names of the injectors that changed the page.
    Applied(Vec<&'static str>),
    AlreadyApplied,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub path: PathBuf,
    pub key: Option<String>,
    pub status: FileStatus,
    /// Soft misses from injectors that did not block the page.
    pub notes: Vec<String>,
}

/// Per-page outcomes of one injection job.
#[derive(Debug, Clone, Default)]
pub struct InjectReport {
    pub label: String,
    pub files: Vec<FileResult>,
}

impl InjectReport {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            files: Vec::new(),
        }
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.status)).count()
    }

    pub fn applied(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Applied(_)))
    }

    pub fn already_applied(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::AlreadyApplied))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed(_)))
    }

    /// Pages that were skipped or failed.
    pub fn problems(&self) -> impl Iterator<Item = &FileResult> {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Skipped(_) | FileStatus::Failed(_)))
    }
}

/// Store and relational data loaded once for the staged injectors.
#[derive(Debug, Clone, Default)]
pub struct StageData {
    pub techniques: BTreeMap<NaturalKey, PublicView>,
    pub tactics: BTreeMap<NaturalKey, PublicView>,
    pub relational: RelationalData,
}

impl StageData {
    pub fn load(root: &Path, config: &AppConfig) -> Result<Self> {
        let store = Bundle::load(&root.join(&config.store.path))?;
        let relational = RelationalData::load(&root.join(&config.store.relational_data))?;
        let id = &config.identity;
        let data = Self {
            techniques: public_views(&store, Category::Technique, &id.source_name, &id.extension_id),
            tactics: public_views(&store, Category::Tactic, &id.source_name, &id.extension_id),
            relational,
        };
        debug!(
            techniques = data.techniques.len(),
            tactics = data.tactics.len(),
            "stage data loaded"
        );
        Ok(data)
    }

    fn context(&self) -> StageContext<'_> {
        StageContext {
            techniques: &self.techniques,
            tactics: &self.tactics,
            relational: &self.relational,
        }
    }
}

fn read_page(path: &Path) -> std::result::Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| e.to_string())
}

fn write_page(path: &Path, text: &str) -> std::result::Result<(), String> {
    write_atomic(path, text.as_bytes()).map_err(|e| e.to_string())
}

/// Apply one stage to every technique, tactic and matrix page it covers.
#[instrument(skip_all, fields(stage = %stage))]
pub fn inject_stage(
    root: &Path,
    config: &AppConfig,
    stage: Stage,
    data: &StageData,
    progress: &dyn ProgressReporter,
) -> InjectReport {
    let pages: Vec<_> = stage_pages(root, &config.documents)
        .into_iter()
        .filter(|p| stage.applies_to(p.kind))
        .collect();
    let total = pages.len();
    let mut report = InjectReport::new(stage.as_str());

    for (i, page) in pages.iter().enumerate() {
        progress.document(&page.path.display().to_string(), i + 1, total);
        let Some(injector) = injector_for(stage, page.kind, page.dir_key.as_deref(), data.context())
        else {
            continue;
        };

        let status = match read_page(&page.path) {
            Err(e) => FileStatus::Failed(e),
            Ok(text) => match inject(&text, injector.as_ref()) {
                InjectOutcome::Applied(out) => match write_page(&page.path, &out) {
                    Ok(()) => FileStatus::Applied(vec![injector.name()]),
                    Err(e) => FileStatus::Failed(e),
                },
                InjectOutcome::AlreadyApplied => FileStatus::AlreadyApplied,
                InjectOutcome::Skipped(reason) => FileStatus::Skipped(reason.to_string()),
            },
        };
        let result = FileResult {
            path: page.path.clone(),
            key: page.dir_key.clone(),
            status,
            notes: Vec::new(),
        };
        log_result(&result);
        report.files.push(result);
    }

    info!(
        applied = report.applied(),
        already = report.already_applied(),
        skipped = report.skipped(),
        failed = report.failed(),
        "stage complete"
    );
    report
}

/// Apply every chrome injector to every `.html` file in the tree.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn inject_chrome(root: &Path, config: &AppConfig, progress: &dyn ProgressReporter) -> InjectReport {
    let files = html_files(root, &config.documents.skip_dirs);
    let injectors = chrome_injectors();
    let total = files.len();
    let mut report = InjectReport::new("chrome");

    for (i, path) in files.iter().enumerate() {
        progress.document(&path.display().to_string(), i + 1, total);
        let mut result = FileResult {
            path: path.clone(),
            key: None,
            status: FileStatus::AlreadyApplied,
            notes: Vec::new(),
        };

        match read_page(path) {
            Err(e) => result.status = FileStatus::Failed(e),
            Ok(original) => {
                let mut text = original;
                let mut applied = Vec::new();
                for injector in &injectors {
                    match inject(&text, injector.as_ref()) {
                        InjectOutcome::Applied(out) => {
                            text = out;
                            applied.push(injector.name());
                        }
                        InjectOutcome::AlreadyApplied => {}
                        InjectOutcome::Skipped(reason) => {
                            result.notes.push(format!("{}: {reason}", injector.name()));
                        }
                    }
                }
                result.status = if !applied.is_empty() {
                    match write_page(path, &text) {
                        Ok(()) => FileStatus::Applied(applied),
                        Err(e) => FileStatus::Failed(e),
                    }
                } else if result.notes.is_empty() {
                    FileStatus::AlreadyApplied
                } else {
                    FileStatus::Skipped(result.notes.join("; "))
                };
            }
        }
        log_result(&result);
        report.files.push(result);
    }

    info!(
        applied = report.applied(),
        already = report.already_applied(),
        skipped = report.skipped(),
        failed = report.failed(),
        "chrome injection complete"
    );
    report
}

/// Rewrite stale disclaimer blocks in every `.html` file.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn refresh_disclaimers(
    root: &Path,
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> InjectReport {
    let files = html_files(root, &config.documents.skip_dirs);
    let total = files.len();
    let mut report = InjectReport::new("refresh-disclaimers");

    for (i, path) in files.iter().enumerate() {
        progress.document(&path.display().to_string(), i + 1, total);
        let status = match read_page(path) {
            Err(e) => FileStatus::Failed(e),
            Ok(text) => match tfasync_inject::refresh_disclaimers(&text) {
                None => FileStatus::AlreadyApplied,
                Some(out) => match write_page(path, &out) {
                    Ok(()) => FileStatus::Applied(vec!["refresh-disclaimers"]),
                    Err(e) => FileStatus::Failed(e),
                },
            },
        };
        let result = FileResult {
            path: path.clone(),
            key: None,
            status,
            notes: Vec::new(),
        };
        log_result(&result);
        report.files.push(result);
    }

    info!(
        updated = report.applied(),
        failed = report.failed(),
        "disclaimer refresh complete"
    );
    report
}

fn log_result(result: &FileResult) {
    let path = result.path.display();
    match &result.status {
        FileStatus::Applied(names) => debug!(%path, injectors = ?names, "page updated"),
        FileStatus::AlreadyApplied => debug!(%path, "page already processed"),
        FileStatus::Skipped(reason) => warn!(%path, %reason, "page skipped"),
        FileStatus::Failed(error) => warn!(%path, %error, "page failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SilentProgress;

    #[test]
    fn chrome_job_is_idempotent_and_reports_failures_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("about")).unwrap();
        std::fs::write(
            root.join("about/index.html"),
            "<body>\n<header>\n<nav>x</nav>\n</header>\n</body>",
        )
        .unwrap();
        std::fs::write(root.join("bad.html"), [0xff, 0xfe, 0x00]).unwrap();

        let config = AppConfig::default();
        let first = inject_chrome(root, &config, &SilentProgress);
        assert_eq!(first.applied(), 1);
        assert_eq!(first.failed(), 1);

        let second = inject_chrome(root, &config, &SilentProgress);
        assert_eq!(second.applied(), 0);
        // The page has no footer, so the legal row stays a soft miss.
        assert_eq!(second.skipped(), 1);
    }
}
