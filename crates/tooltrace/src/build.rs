use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use tooltrace_core::{
    discover_log_files, DatasetBuilder, DatasetError, DatasetStats, FileEvents, RowSink,
    DEFAULT_WINDOW_SIZE,
};

use crate::config::{default_projects_dir, expand_home, ToolTraceConfig};

#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Directory scanned recursively for *.jsonl session logs (default: ~/.claude/projects)
    #[arg(long)]
    pub projects_dir: Option<PathBuf>,

    /// Output dataset path (JSONL); stats are written to <OUT>.stats.json
    #[arg(short, long)]
    pub out: PathBuf,

    /// Only read the N most recently modified files (0 = all)
    #[arg(long, default_value_t = 0)]
    pub max_files: usize,

    /// Stop after writing N rows (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    pub max_rows: usize,

    /// Context messages captured per row
    #[arg(long)]
    pub max_context_messages: Option<usize>,

    /// Record messages seen between a tool call and its result in the trace
    /// (`--include-messages-in-trace=false` overrides a config `true`)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub include_messages_in_trace: Option<bool>,

    /// Files processed in parallel, each with its own correlator (default: 1)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Effective settings after merging flags, config file and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSettings {
    pub projects_dir: PathBuf,
    pub out: PathBuf,
    pub max_files: usize,
    pub max_rows: usize,
    pub max_context_messages: usize,
    pub include_messages_in_trace: bool,
    pub jobs: usize,
}

impl BuildSettings {
    /// Priority: flag > config file > default
    pub fn resolve(args: BuildArgs, config: Option<&ToolTraceConfig>) -> Result<Self> {
        let config_dir = config.and_then(|c| c.projects_dir.clone());
        let projects_dir = args
            .projects_dir
            .or(config_dir)
            .or_else(default_projects_dir)
            .context("Could not determine projects directory; pass --projects-dir")?;

        Ok(Self {
            projects_dir: expand_home(&projects_dir),
            out: expand_home(&args.out),
            max_files: args.max_files,
            max_rows: args.max_rows,
            max_context_messages: args
                .max_context_messages
                .or(config.and_then(|c| c.max_context_messages))
                .unwrap_or(DEFAULT_WINDOW_SIZE),
            include_messages_in_trace: args
                .include_messages_in_trace
                .or(config.and_then(|c| c.include_messages_in_trace))
                .unwrap_or(false),
            jobs: args
                .jobs
                .or(config.and_then(|c| c.jobs))
                .unwrap_or(1)
                .max(1),
        })
    }

    fn dataset_builder(&self) -> DatasetBuilder {
        DatasetBuilder::new()
            .with_max_context_messages(self.max_context_messages)
            .with_messages_in_trace(self.include_messages_in_trace)
    }
}

/// What happened while reading the selected files.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub files_read: usize,
    pub files_skipped: usize,
    /// Tool calls still waiting for a result when their stream ended.
    pub unresolved: usize,
}

impl RunReport {
    fn merge(&mut self, other: RunReport) {
        self.files_read += other.files_read;
        self.files_skipped += other.files_skipped;
        self.unresolved += other.unresolved;
    }
}

pub async fn handle_build_command(args: BuildArgs, config: Option<&ToolTraceConfig>) -> Result<()> {
    let settings = BuildSettings::resolve(args, config)?;
    let started = Instant::now();

    let files = discover_log_files(&settings.projects_dir, settings.max_files)
        .with_context(|| format!("Failed to list logs in {}", settings.projects_dir.display()))?;
    info!(
        files = files.len(),
        projects_dir = %settings.projects_dir.display(),
        jobs = settings.jobs,
        "Building dataset"
    );

    let sink = RowSink::create(&settings.out)
        .with_context(|| format!("Failed to create {}", settings.out.display()))?
        .with_max_rows(settings.max_rows);
    let sink = Arc::new(sink);
    let file_count = files.len();

    let report = if settings.jobs > 1 {
        run_parallel(&settings, files, Arc::clone(&sink)).await?
    } else {
        let builder = settings.dataset_builder();
        let sink = Arc::clone(&sink);
        tokio::task::spawn_blocking(move || run_sequential(&builder, &files, &sink))
            .await
            .context("Dataset worker panicked")??
    };

    let sink = Arc::try_unwrap(sink).map_err(|_| anyhow!("Row sink is still in use"))?;
    let (_, stats) = sink.finish(file_count)?;

    let stats_path = DatasetStats::path_for(&settings.out);
    stats
        .write_to(&stats_path)
        .with_context(|| format!("Failed to write {}", stats_path.display()))?;

    info!(
        rows = stats.rows,
        files_read = report.files_read,
        files_skipped = report.files_skipped,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Dataset complete"
    );
    debug!(unresolved = report.unresolved, "Tool calls without a result");

    print_summary(&settings.out, &stats_path, &stats, &report);
    Ok(())
}

/// All files, in order, through one correlator.
fn run_sequential(
    builder: &DatasetBuilder,
    files: &[PathBuf],
    sink: &RowSink,
) -> Result<RunReport, DatasetError> {
    let mut correlator = builder.correlator();
    let mut report = RunReport::default();

    'files: for path in files {
        if sink.is_closed() {
            break;
        }
        let events = match FileEvents::open(path) {
            Ok(events) => events,
            Err(e) => {
                warn!("Skipping {:?}: {}", path, e);
                report.files_skipped += 1;
                continue;
            }
        };
        report.files_read += 1;
        debug!(path = ?path, "Reading log file");

        for event in events {
            if let Some(row) = correlator.push(event) {
                sink.write_row(&row)?;
                if sink.is_closed() {
                    break 'files;
                }
            }
        }
    }

    report.unresolved = correlator.finish();
    Ok(report)
}

/// One correlator per file, files spread over blocking workers.
async fn run_parallel(
    settings: &BuildSettings,
    files: Vec<PathBuf>,
    sink: Arc<RowSink>,
) -> Result<RunReport> {
    let builder = settings.dataset_builder();
    let permits = Arc::new(Semaphore::new(settings.jobs));
    let mut tasks = JoinSet::new();

    for path in files {
        if sink.is_closed() {
            break;
        }
        let permit = Arc::clone(&permits).acquire_owned().await?;
        let builder = builder.clone();
        let sink = Arc::clone(&sink);
        tasks.spawn_blocking(move || {
            let _permit = permit;
            process_file(&builder, &path, &sink)
        });
    }

    let mut report = RunReport::default();
    while let Some(joined) = tasks.join_next().await {
        let file_report = joined.context("Dataset worker panicked")??;
        report.merge(file_report);
    }
    Ok(report)
}

fn process_file(
    builder: &DatasetBuilder,
    path: &Path,
    sink: &RowSink,
) -> Result<RunReport, DatasetError> {
    let events = match FileEvents::open(path) {
        Ok(events) => events,
        Err(e) => {
            warn!("Skipping {:?}: {}", path, e);
            return Ok(RunReport {
                files_skipped: 1,
                ..Default::default()
            });
        }
    };
    debug!(path = ?path, "Reading log file");

    let mut correlator = builder.correlator();
    for event in events {
        if let Some(row) = correlator.push(event) {
            sink.write_row(&row)?;
            if sink.is_closed() {
                break;
            }
        }
    }

    Ok(RunReport {
        files_read: 1,
        files_skipped: 0,
        unresolved: correlator.finish(),
    })
}

fn print_summary(out: &Path, stats_path: &Path, stats: &DatasetStats, report: &RunReport) {
    eprintln!();
    eprintln!("{}", "=== DATASET ===".bold());
    eprintln!(
        "{} {} rows to {}",
        "Wrote".green(),
        stats.rows,
        out.display()
    );
    eprintln!("{} stats to {}", "Wrote".green(), stats_path.display());
    eprintln!(
        "Files: {} read, {} skipped",
        report.files_read, report.files_skipped
    );
    if report.files_skipped > 0 {
        eprintln!("{}", "Some files could not be opened; see warnings above.".yellow());
    }

    let top: Vec<String> = stats
        .tool_name_counts
        .iter()
        .take(5)
        .map(|(name, count)| format!("{} ({})", name, count))
        .collect();
    if !top.is_empty() {
        eprintln!("Top tools: {}", top.join(", ").dimmed());
    }
}
