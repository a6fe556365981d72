//! Lesson-Harvest main entry point
//!
//! This is the command-line interface for the Lesson-Harvest course material harvester.

use anyhow::{bail, Context};
use clap::Parser;
use lesson_harvest::config::{load_config_with_hash, Config};
use lesson_harvest::crawler::{is_valid_course_id, scan};
use lesson_harvest::output::{compute_statistics, generate_scan_report, print_statistics, ReportContext};
use lesson_harvest::{
    filter_by_kinds, FileSaver, ProgressReporter, ResourceDescriptor, ResourceKind,
    RetrievalQueue, TracingReporter,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Lesson-Harvest: a course material harvester
///
/// Lesson-Harvest walks the lesson pages of a course, lists the books, summaries,
/// slide decks and mind maps each lesson links to, and downloads the selected
/// kinds with a bounded number of parallel transfers.
#[derive(Parser, Debug)]
#[command(name = "lesson-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A course material harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Identifier of the course to scan
    #[arg(value_name = "COURSE_ID")]
    course_id: String,

    /// Resource kinds to download (comma separated, default: all)
    #[arg(long, value_delimiter = ',', value_parser = parse_kind)]
    kinds: Vec<ResourceKind>,

    /// Scan and report without downloading anything
    #[arg(long)]
    dry_run: bool,

    /// Write a markdown scan report to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Override the configured output directory
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn parse_kind(value: &str) -> Result<ResourceKind, String> {
    value.parse()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if !is_valid_course_id(&cli.course_id) {
        bail!("Invalid course id: {:?}", cli.course_id);
    }

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(dir) = &cli.output_dir {
        config.retrieval.output_dir = dir.clone();
    }

    let reporter: Arc<dyn ProgressReporter> = Arc::new(TracingReporter);
    let resources = scan(&config, &cli.course_id, Some(reporter.as_ref()))
        .await
        .context("Scan failed")?;

    let stats = compute_statistics(&resources);
    if !cli.quiet {
        print_statistics(&stats);
    }

    if let Some(path) = &cli.report {
        let context = ReportContext::now(cli.course_id.clone(), Some(config_hash.clone()));
        generate_scan_report(&context, &resources, path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        tracing::info!("Report written to: {}", path.display());
    }

    let selected = select_kinds(&resources, &cli.kinds);
    if cli.dry_run {
        println!(
            "\n✓ Dry run: would download {} of {} resources into {}",
            selected.len(),
            resources.len(),
            config.retrieval.output_dir.display()
        );
        return Ok(());
    }

    handle_download(&config, selected, reporter).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lesson_harvest=info,warn"),
            1 => EnvFilter::new("lesson_harvest=debug,info"),
            2 => EnvFilter::new("lesson_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies the `--kinds` selection; no selection means every kind
fn select_kinds(resources: &[ResourceDescriptor], kinds: &[ResourceKind]) -> Vec<ResourceDescriptor> {
    if kinds.is_empty() {
        filter_by_kinds(resources, &ResourceKind::all())
    } else {
        filter_by_kinds(resources, kinds)
    }
}

/// Runs the retrieval queue until it drains or Ctrl-C stops it
async fn handle_download(
    config: &Config,
    items: Vec<ResourceDescriptor>,
    reporter: Arc<dyn ProgressReporter>,
) -> anyhow::Result<()> {
    if items.is_empty() {
        tracing::warn!("Nothing to download");
        return Ok(());
    }

    let saver = FileSaver::from_config(config).context("Failed to build HTTP client")?;
    tracing::info!(
        "Downloading {} resources into {} ({} at a time)",
        items.len(),
        saver.output_dir().display(),
        config.retrieval.max_concurrent
    );

    let queue = RetrievalQueue::new(Arc::new(saver), config.retrieval.clone()).with_reporter(reporter);

    let interrupt = queue.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing active downloads");
            interrupt.stop();
        }
    });

    let summary = queue.start(items).await;
    watcher.abort();

    println!(
        "\n✓ Downloaded {} of {} resources ({} failed, {} skipped)",
        summary.completed,
        summary.total,
        summary.failed,
        summary.skipped()
    );

    if summary.failed > 0 {
        bail!("{} downloads failed", summary.failed);
    }

    Ok(())
}
