use clap::Parser;
use colored::Colorize;
use offsetscout::{scan, CliOverrides, ScanConfig, ScanMode, ScanOutcome, SearchError};
use std::{num::NonZeroUsize, path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, SearchError>;

/// Exit status when some files could not be scanned
const EXIT_PARTIAL: u8 = 2;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Term to search for (matched as literal bytes)
    term: Option<String>,

    /// Root directory to scan
    #[arg(short = 'd', long)]
    root: Option<PathBuf>,

    /// Bytes per read; must be at least the length of the term
    #[arg(short = 'b', long)]
    buffer_size: Option<NonZeroUsize>,

    /// Number of worker threads
    #[arg(short = 'j', long)]
    workers: Option<NonZeroUsize>,

    /// Scan one file at a time and stop at the first error
    #[arg(long)]
    serial: bool,

    /// Patterns to ignore (glob format, relative to the root)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// File extensions to include (e.g. log,txt)
    #[arg(short = 'e', long)]
    extensions: Option<String>,

    /// Skip hidden files and honour .gitignore/.ignore files
    #[arg(long)]
    respect_ignore: bool,

    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show only statistics, not offsets
    #[arg(short, long)]
    stats: bool,

    /// Print the outcome as JSON
    #[arg(long, conflicts_with = "stats")]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            if e.is_per_file() {
                eprintln!(
                    "{} serial scans stop at the first unreadable file; drop --serial to skip it",
                    "hint:".cyan()
                );
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        term: cli.term,
        root_path: cli.root,
        buffer_size: cli.buffer_size,
        worker_count: cli.workers,
        mode: cli.serial.then_some(ScanMode::Serial),
        ignore_patterns: cli.ignore,
        file_extensions: cli.extensions.as_ref().map(|e| {
            e.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        }),
        respect_ignore_files: cli.respect_ignore,
        log_level: cli.log_level,
    };

    let config = ScanConfig::load_from(cli.config.as_deref())?.merge_with_cli(overrides);
    init_logging(&config.log_level);

    if config.term.is_empty() {
        return Err(SearchError::config_error(
            "no search term given (pass it as an argument or set `term` in the config file)",
        ));
    }

    let outcome = scan(&config)?;

    if cli.json {
        print_json(&outcome);
    } else {
        print_scan_results(&outcome, cli.stats);
    }

    if let Some(err) = outcome.combined_error() {
        for failure in &outcome.file_errors {
            eprintln!("{} {}", "failed:".yellow(), failure.error);
        }
        tracing::debug!("Combined file errors: {}", err);
        return Ok(ExitCode::from(EXIT_PARTIAL));
    }
    Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr; `RUST_LOG` wins over the configured level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_scan_results(outcome: &ScanOutcome, stats_only: bool) {
    let stats = &outcome.stats;
    if stats_only {
        println!(
            "Found {} matches in {} files",
            stats.total_matches, stats.files_with_matches
        );
        println!(
            "Scanned {} files ({} bytes), {} failed, in {:?}",
            stats.files_scanned, stats.bytes_scanned, stats.files_failed, stats.elapsed
        );
        return;
    }

    for file_result in outcome.sorted_results() {
        if file_result.offsets.is_empty() {
            continue;
        }
        println!("{}", file_result.path.display().to_string().blue());
        for offset in &file_result.offsets {
            println!("  {}", offset.to_string().green());
        }
    }

    println!(
        "\nFound {} matches in {} files",
        stats.total_matches, stats.files_with_matches
    );
}

fn print_json(outcome: &ScanOutcome) {
    // Paths are not always UTF-8, so they are rendered lossily rather than
    // through `PathBuf`'s serializer.
    let results: Vec<_> = outcome
        .sorted_results()
        .into_iter()
        .map(|r| {
            serde_json::json!({
                "path": r.path.to_string_lossy(),
                "offsets": r.offsets,
            })
        })
        .collect();
    let errors: Vec<_> = outcome
        .file_errors
        .iter()
        .map(|f| {
            serde_json::json!({
                "path": f.path.to_string_lossy(),
                "error": f.error.to_string(),
            })
        })
        .collect();
    let doc = serde_json::json!({
        "results": results,
        "errors": errors,
        "stats": outcome.stats,
    });
    println!("{:#}", doc);
}
