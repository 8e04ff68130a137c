//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tfasync_core::inject::{FileStatus, InjectReport, StageData, inject_chrome, inject_stage};
use tfasync_core::pipeline::ProgressReporter;
use tfasync_core::sync::{ExtractSummary, SyncJobResult};
use tfasync_inject::Stage;
use tfasync_shared::{AppConfig, init_config, load_config};
use tfasync_store::WriteOutcome;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// tfasync — keep the TFA Matrix site and its STIX store in step.
#[derive(Parser)]
#[command(
    name = "tfasync",
    version,
    about = "Extract public content from TFA Matrix pages, synchronize the STIX store, and inject page structure.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Root of the site tree (holds tfasync.toml, pages and the store).
    #[arg(long, default_value = ".", env = "TFASYNC_ROOT", global = true)]
    pub root: PathBuf,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Extract public content from technique pages into a JSON file.
    Extract,

    /// Extract public content and synchronize the STIX store.
    Sync,

    /// Apply injection stages or site chrome to pages.
    Inject {
        #[arg(value_enum)]
        target: InjectTarget,
    },

    /// Rewrite existing disclaimer blocks with the current wording.
    RefreshDisclaimers,

    /// Every injection stage, chrome, then sync.
    Run,

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum InjectTarget {
    DualView,
    Disclaimers,
    Tables,
    Chrome,
    All,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "tfasync=info",
        1 => "tfasync=debug",
        _ => "tfasync=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let root = cli.root.as_path();
    match cli.command {
        Command::Extract => cmd_extract(root),
        Command::Sync => cmd_sync(root),
        Command::Inject { target } => cmd_inject(root, target),
        Command::RefreshDisclaimers => cmd_refresh(root),
        Command::Run => cmd_run(root),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(root),
            ConfigAction::Show => cmd_config_show(root),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_extract(root: &Path) -> Result<()> {
    let config = load_config(root)?;
    let reporter = CliProgress::new();
    let result = tfasync_core::export_extractions(root, &config, &reporter)?;
    reporter.done();

    println!();
    print_extraction(&result.summary);
    println!("  Output:     {}", result.output.display());
    println!();
    Ok(())
}

fn cmd_sync(root: &Path) -> Result<()> {
    let config = load_config(root)?;
    let reporter = CliProgress::new();
    let result = tfasync_core::sync_store(root, &config, &reporter)?;
    reporter.done();

    println!();
    print_sync(&result, &config);
    coverage_verdict(&result)
}

fn cmd_inject(root: &Path, target: InjectTarget) -> Result<()> {
    let config = load_config(root)?;
    let stages: &[Stage] = match target {
        InjectTarget::DualView => &[Stage::DualView],
        InjectTarget::Disclaimers => &[Stage::Disclaimers],
        InjectTarget::Tables => &[Stage::Tables],
        InjectTarget::Chrome => &[],
        InjectTarget::All => &Stage::ALL,
    };
    info!(inject = ?target, "injecting");

    let reporter = CliProgress::new();
    let mut reports = Vec::new();
    if !stages.is_empty() {
        let data = StageData::load(root, &config)?;
        for &stage in stages {
            reporter.phase(&format!("Injecting {stage}"));
            reports.push(inject_stage(root, &config, stage, &data, &reporter));
        }
    }
    if matches!(target, InjectTarget::Chrome | InjectTarget::All) {
        reporter.phase("Injecting site chrome");
        reports.push(inject_chrome(root, &config, &reporter));
    }
    reporter.done();

    println!();
    for report in &reports {
        print_inject(report);
    }
    Ok(())
}

fn cmd_refresh(root: &Path) -> Result<()> {
    let config = load_config(root)?;
    let reporter = CliProgress::new();
    reporter.phase("Refreshing disclaimers");
    let report = tfasync_core::inject::refresh_disclaimers(root, &config, &reporter);
    reporter.done();

    println!();
    print_inject(&report);
    Ok(())
}

fn cmd_run(root: &Path) -> Result<()> {
    let config = load_config(root)?;
    let reporter = CliProgress::new();
    let result = tfasync_core::run_pipeline(root, &config, &reporter)?;

    println!();
    for report in result.stages.iter().chain(std::iter::once(&result.chrome)) {
        print_inject(report);
    }
    print_sync(&result.sync, &config);
    println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
    println!();
    coverage_verdict(&result.sync)
}

fn cmd_config_init(root: &Path) -> Result<()> {
    let path = init_config(root)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(root: &Path) -> Result<()> {
    let config: AppConfig = load_config(root)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

fn print_extraction(summary: &ExtractSummary) {
    println!("  Extraction");
    println!("  Documents:  {}", summary.documents);
    println!("  Records:    {}", summary.batch.records.len());
    println!("  Omitted:    {}", summary.batch.omitted.len());
    println!("  Unkeyed:    {}", summary.unkeyed.len());
    println!("  Unreadable: {}", summary.failed.len());
    for (key, reason) in &summary.batch.omitted {
        println!("    - {key}: {reason}");
    }
    for (path, error) in &summary.failed {
        println!("    - {}: {error}", path.display());
    }
}

fn print_sync(result: &SyncJobResult, config: &AppConfig) {
    let report = &result.report;
    print_extraction(&result.extraction);
    println!();
    println!("  Synchronization");
    println!("  Removed:        {}", report.removed);
    println!("  Mitigations:    {}", report.mitigations_added);
    println!("  Detections:     {}", report.detections_added);
    println!("  Relationships:  {}", report.relationships_added);
    println!("  Duplicates:     {}", report.duplicate_declarations);
    println!("  Matched:        {}", report.matched.len());
    println!("  Unmatched:      {}", report.unmatched.len());
    println!(
        "  Coverage:       {}/{} ({:.1}%, minimum {:.1}%)",
        report.coverage.matched,
        report.coverage.expected,
        report.coverage.ratio() * 100.0,
        report.coverage.minimum * 100.0
    );
    for dropped in &report.dropped_relationships {
        println!("    - dropped {dropped}");
    }

    let failing = report.failing_keys();
    if !failing.is_empty() {
        let keys: Vec<&str> = failing.iter().map(|k| k.as_str()).collect();
        println!("  Failing keys:   {}", keys.join(", "));
    }

    let verification = &report.verification;
    println!(
        "  Public titles:  {}/{} techniques",
        verification.with_public_title, verification.techniques
    );
    if !verification.missing.is_empty() {
        let keys: Vec<&str> = verification.missing.iter().map(|k| k.as_str()).collect();
        println!("  Missing title:  {}", keys.join(", "));
    }

    let store = &config.store.path;
    match &result.write {
        Some(WriteOutcome::Written { backup, digest, .. }) => {
            println!("  Store:          {store} written ({})", &digest[..12]);
            if let Some(backup) = backup {
                println!("  Backup:         {}", backup.display());
            }
        }
        Some(WriteOutcome::Unchanged { .. }) => println!("  Store:          {store} unchanged"),
        None => println!("  Store:          {store} left untouched (aborted)"),
    }
    if let Some(catalogue) = &result.catalogue {
        println!(
            "  Catalogue CSV:  {} ({} mitigations + {} detections)",
            catalogue.path.display(),
            catalogue.mitigations,
            catalogue.detections
        );
    }
}

fn print_inject(report: &InjectReport) {
    println!("  Inject {}", report.label);
    println!(
        "  Applied: {}  Already: {}  Skipped: {}  Failed: {}",
        report.applied(),
        report.already_applied(),
        report.skipped(),
        report.failed()
    );
    for file in report.problems() {
        let reason = match &file.status {
            FileStatus::Skipped(reason) | FileStatus::Failed(reason) => reason.as_str(),
            _ => "",
        };
        let name = file
            .key
            .clone()
            .unwrap_or_else(|| file.path.display().to_string());
        println!("    - {name}: {reason}");
    }
    println!();
}

fn coverage_verdict(result: &SyncJobResult) -> Result<()> {
    if result.aborted {
        let coverage = &result.report.coverage;
        return Err(eyre!(
            "coverage {:.1}% is below the minimum {:.1}%; store left untouched",
            coverage.ratio() * 100.0,
            coverage.minimum * 100.0
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] {path}"));
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}
