//! MediaSort - Command-line interface for the media ingest engine.
//!
//! Sorts the files of a source file or directory into `YYYY-MM` folders under
//! a library root, then reports what happened to each file.

mod config;

use clap::Parser;
use config::{DateSource, FileConfig};
use mediasort_engine::{
    fs_ops, ChannelListener, ChecksumAlgorithm, DateFolderResolver, ExifDateResolver, Mode,
    ModifiedTimeResolver, TransferEngine, TransferEvent, TransferOutcome, TransferTask,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// MediaSort - Sort photos and videos into date folders
#[derive(Parser, Debug)]
#[command(name = "mediasort")]
#[command(version = "0.1.0")]
#[command(about = "Copy or move media into YYYY-MM folders without overwriting anything")]
struct Args {
    /// Source file or directory
    #[arg(long, value_name = "PATH")]
    src: PathBuf,

    /// Library root the date folders are created under
    #[arg(long, value_name = "PATH")]
    dst: Option<PathBuf>,

    /// Operation mode: copy or move
    #[arg(long, value_name = "MODE")]
    mode: Option<String>,

    /// Directory for byte-identical duplicates (default: <dst>/duplicates)
    #[arg(long, value_name = "PATH")]
    duplicates: Option<PathBuf>,

    /// Fail on occupied destinations instead of rerouting duplicates and
    /// versioning name clashes
    #[arg(long)]
    no_preserve_duplicates: bool,

    /// Digest used to detect duplicates: md5, sha256, blake3
    #[arg(long, value_name = "ALGORITHM")]
    hash: Option<String>,

    /// Date folder source: exif (capture date, media only) or mtime
    #[arg(long, value_name = "SOURCE")]
    date_source: Option<String>,

    /// Descend into subdirectories of the source
    #[arg(long, short = 'r')]
    recursive: bool,

    /// Enable verbose output
    #[arg(long)]
    verbose: bool,

    /// TOML file with default settings
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. info, debug, mediasort_engine=trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

/// Effective settings after merging the config file and flags
#[derive(Debug)]
struct Settings {
    source: PathBuf,
    destination: PathBuf,
    duplicates: PathBuf,
    mode: Mode,
    hash: ChecksumAlgorithm,
    preserve_duplicates: bool,
    recursive: bool,
    date_source: DateSource,
}

/// What happened to every file of a run
#[derive(Debug, Default)]
struct RunSummary {
    done: usize,
    bytes: u64,
    failed: Vec<(PathBuf, String)>,
    unresolved: Vec<(PathBuf, String)>,
}

impl RunSummary {
    fn has_failures(&self) -> bool {
        !self.failed.is_empty() || !self.unresolved.is_empty()
    }
}

/// Console reporting for a run
struct CliReport {
    verbose: bool,
    start_time: Instant,
}

impl CliReport {
    fn new(verbose: bool) -> Self {
        CliReport {
            verbose,
            start_time: Instant::now(),
        }
    }

    fn format_bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_idx = 0;

        while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
            size /= 1024.0;
            unit_idx += 1;
        }

        format!("{:.2} {}", size, UNITS[unit_idx])
    }

    fn format_duration(elapsed: std::time::Duration) -> String {
        let secs = elapsed.as_secs();
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        let secs = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, mins, secs)
        } else if mins > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}s", secs)
        }
    }

    fn file_name(path: &Path) -> &str {
        path.file_name().and_then(|n| n.to_str()).unwrap_or("(unknown)")
    }

    fn on_started(&self, settings: &Settings, files: usize) {
        eprintln!("Preparing ingest...");
        eprintln!("  Source: {}", settings.source.display());
        eprintln!("  Destination: {}", settings.destination.display());
        eprintln!("  Duplicates: {}", settings.duplicates.display());
        eprintln!("  Mode: {}", settings.mode);
        eprintln!("  Dates: {:?}", settings.date_source);
        eprintln!("  Files: {}", files);
        eprintln!();
    }

    fn on_item(&self, index: usize, task: &TransferTask, outcome: &TransferOutcome) {
        if !self.verbose {
            return;
        }
        let name = Self::file_name(&task.source);
        match outcome {
            TransferOutcome::Done { destination, .. } => {
                eprintln!("[{:3}] Done: {} -> {}", index, name, destination.display())
            }
            TransferOutcome::Failed { error_message, .. } => {
                eprintln!("[{:3}] Failed: {}: {}", index, name, error_message)
            }
        }
    }

    fn on_completed(&self, summary: &RunSummary) {
        eprintln!();
        eprintln!("Ingest complete!");
        eprintln!(
            "Summary: {} done, {} failed, {} unresolved",
            summary.done,
            summary.failed.len(),
            summary.unresolved.len()
        );
        eprintln!("Bytes transferred: {}", Self::format_bytes(summary.bytes));
        eprintln!("Elapsed: {}", Self::format_duration(self.start_time.elapsed()));

        if !summary.failed.is_empty() {
            eprintln!();
            eprintln!("Failed files:");
            for (path, msg) in &summary.failed {
                eprintln!("  {}: {}", Self::file_name(path), msg);
            }
        }

        if !summary.unresolved.is_empty() {
            eprintln!();
            eprintln!("Files without a date folder:");
            for (path, msg) in &summary.unresolved {
                eprintln!("  {}: {}", Self::file_name(path), msg);
            }
        }
    }
}

/// Parse arguments, set up logging, then run the ingest
fn main() {
    let args = Args::parse();
    init_logging(&args);

    let exit_code = match run_cli(&args) {
        Ok(summary) if summary.has_failures() => 2,
        Ok(_) => 0,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            2
        }
    };

    std::process::exit(exit_code);
}

/// RUST_LOG wins, then --log-level, then info (debug with --verbose)
fn init_logging(args: &Args) {
    let fallback = match (&args.log_level, args.verbose) {
        (Some(level), _) => level.clone(),
        (None, true) => "debug".to_string(),
        (None, false) => "info".to_string(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Merge the optional config file with the flags; flags win
fn resolve_settings(args: &Args) -> Result<Settings, String> {
    let file = match &args.config {
        Some(path) => config::load(path).map_err(|e| e.to_string())?,
        None => FileConfig::default(),
    };

    let destination = args
        .dst
        .clone()
        .or(file.destination)
        .ok_or_else(|| "No destination given. Use --dst or set 'destination' in the config file".to_string())?;

    let mode = match &args.mode {
        Some(mode) => Mode::from_str(mode)
            .ok_or_else(|| format!("Invalid mode '{}'. Must be 'copy' or 'move'", mode))?,
        None => file.mode.unwrap_or_default(),
    };

    let hash = match &args.hash {
        Some(hash) => ChecksumAlgorithm::from_str(hash).ok_or_else(|| {
            format!(
                "Invalid hash algorithm '{}'. Must be 'md5', 'sha256', or 'blake3'",
                hash
            )
        })?,
        None => file.hash.unwrap_or_default(),
    };

    let duplicates = args
        .duplicates
        .clone()
        .or(file.duplicates)
        .unwrap_or_else(|| destination.join("duplicates"));

    let date_source = match &args.date_source {
        Some(source) => DateSource::from_str(source)
            .ok_or_else(|| format!("Invalid date source '{}'. Must be 'exif' or 'mtime'", source))?,
        None => file.date_source.unwrap_or_default(),
    };

    let preserve_duplicates = !args.no_preserve_duplicates && file.preserve_duplicates.unwrap_or(true);
    let recursive = args.recursive || file.recursive.unwrap_or(false);

    Ok(Settings {
        source: args.src.clone(),
        destination,
        duplicates,
        mode,
        hash,
        preserve_duplicates,
        recursive,
        date_source,
    })
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> Result<RunSummary, String> {
    let settings = resolve_settings(args)?;

    if !settings.source.exists() {
        return Err(format!("Source does not exist: {}", settings.source.display()));
    }

    let files = fs_ops::enumerate_files(&settings.source, settings.recursive)
        .map_err(|e| format!("Cannot read source: {}", e))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .map_err(|e| format!("Cannot start runtime: {}", e))?;

    let (listener, events) = ChannelListener::new();
    let engine = TransferEngine::new(runtime.handle(), settings.hash, listener);
    engine
        .set_duplicates_dir(&settings.duplicates)
        .map_err(|e| format!("Cannot prepare duplicates directory: {}", e))?;

    let report = CliReport::new(args.verbose);
    report.on_started(&settings, files.len());

    let mut summary = RunSummary::default();
    let resolver: Box<dyn DateFolderResolver> = match settings.date_source {
        DateSource::Exif => Box::new(ExifDateResolver),
        DateSource::Mtime => Box::new(ModifiedTimeResolver),
    };
    let mut submitted = 0;

    for file in files {
        let folder = match resolver.resolve(&file) {
            Ok(folder) => folder,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "skipping file without a date folder");
                summary.unresolved.push((file, e.to_string()));
                continue;
            }
        };

        let task = TransferTask::new(
            &file,
            settings.destination.join(folder.to_string()),
            settings.mode,
            settings.preserve_duplicates,
        );
        match engine.submit(task) {
            Ok(id) => {
                debug!(task = %id, file = %file.display(), folder = %folder, "submitted");
                submitted += 1;
            }
            Err(e) => summary.failed.push((file, e.to_string())),
        }
    }

    let mut processed = 0;
    while processed < submitted {
        let event = events
            .recv()
            .map_err(|_| "Transfer engine stopped unexpectedly".to_string())?;

        match event {
            TransferEvent::ItemProcessed { task, outcome, .. } => {
                processed += 1;
                report.on_item(processed, &task, &outcome);
                match outcome {
                    TransferOutcome::Done { bytes, .. } => {
                        summary.done += 1;
                        summary.bytes += bytes;
                    }
                    TransferOutcome::Failed { error_message, .. } => {
                        summary.failed.push((task.source, error_message));
                    }
                }
            }
            TransferEvent::QueueDrained => {}
        }
    }

    // The queue may drain between submissions; wait for the final drain
    if submitted > 0 {
        loop {
            match events.recv() {
                Ok(TransferEvent::QueueDrained) | Err(_) => break,
                Ok(TransferEvent::ItemProcessed { .. }) => {}
            }
        }
    }

    report.on_completed(&summary);
    Ok(summary)
}
