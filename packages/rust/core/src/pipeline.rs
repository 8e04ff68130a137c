//! Progress reporting and the full `run` pipeline.

use std::path::Path;
use std::time::{Duration, Instant};

use tfasync_inject::Stage;
use tfasync_shared::{AppConfig, Result};
use tracing::{info, instrument};

use crate::inject::{InjectReport, StageData, inject_chrome, inject_stage};
use crate::sync::{SyncJobResult, sync_store};

/// Progress callback for reporting job status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each document is processed.
    fn document(&self, path: &str, current: usize, total: usize);
    /// Called when the job completes.
    fn done(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self) {}
}

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub stages: Vec<InjectReport>,
    pub chrome: InjectReport,
    pub sync: SyncJobResult,
    pub elapsed: Duration,
}

/// Dual view, disclaimers, tables, chrome, then extract and sync.
///
/// Page injection commits per file, so pages processed before a coverage
/// abort stay processed; a re-run skips them.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn run_pipeline(
    root: &Path,
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> Result<RunResult> {
    let start = Instant::now();
    let data = StageData::load(root, config)?;

    let mut stages = Vec::with_capacity(Stage::ALL.len());
    for stage in Stage::ALL {
        progress.phase(&format!("Injecting {stage}"));
        stages.push(inject_stage(root, config, stage, &data, progress));
    }

    progress.phase("Injecting site chrome");
    let chrome = inject_chrome(root, config, progress);

    let sync = sync_store(root, config, progress)?;
    let elapsed = start.elapsed();
    progress.done();

    info!(
        aborted = sync.aborted,
        elapsed_ms = elapsed.as_millis() as u64,
        "run complete"
    );
    Ok(RunResult {
        stages,
        chrome,
        sync,
        elapsed,
    })
}
