use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::SearchResult;
use crate::walk::WalkOptions;

/// Which engine a configured scan runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// One file at a time; the first error aborts the scan
    Serial,
    /// Worker pool; per-file errors are collected
    #[default]
    Parallel,
}

/// Configuration for a scan.
///
/// # Configuration Locations
///
/// Loaded from these files, later ones taking precedence:
/// 1. Global `$CONFIG_DIR/offsetscout/config.yaml`
/// 2. Local `.offsetscout.yaml` in the current directory
/// 3. A file given explicitly (the CLI's `--config` flag)
///
/// # Configuration Format
///
/// ```yaml
/// term: "create"
/// root_path: "logs"
/// buffer_size: 4096
/// worker_count: 8
/// mode: parallel          # or serial
/// ignore_patterns:
///   - "archive/**"
/// file_extensions: ["log"]
/// respect_ignore_files: false
/// log_level: "info"
/// ```
///
/// Every key is optional. Command-line values override file values through
/// [`ScanConfig::merge_with_cli`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// The literal term to search for
    #[serde(default)]
    pub term: String,

    /// Root directory to scan
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Bytes requested per read; must be at least the term length
    #[serde(default = "default_buffer_size")]
    pub buffer_size: NonZeroUsize,

    /// Number of parallel workers
    /// Defaults to number of CPU cores if not specified
    #[serde(default = "default_worker_count")]
    pub worker_count: NonZeroUsize,

    /// Engine to run
    #[serde(default)]
    pub mode: ScanMode,

    /// Patterns to ignore (glob syntax, relative to the root)
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Optional list of file extensions to include (e.g., ["log", "txt"])
    #[serde(default)]
    pub file_extensions: Option<Vec<String>>,

    /// Skip hidden files and honour .gitignore/.ignore files
    #[serde(default)]
    pub respect_ignore_files: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Values given on the command line; `None` keeps the file value
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub term: Option<String>,
    pub root_path: Option<PathBuf>,
    pub buffer_size: Option<NonZeroUsize>,
    pub worker_count: Option<NonZeroUsize>,
    pub mode: Option<ScanMode>,
    pub ignore_patterns: Vec<String>,
    pub file_extensions: Option<Vec<String>>,
    pub respect_ignore_files: bool,
    pub log_level: Option<String>,
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

pub(crate) const DEFAULT_BUFFER_SIZE: usize = 1024;

fn default_buffer_size() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_BUFFER_SIZE).unwrap_or(NonZeroUsize::MIN)
}

fn default_worker_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            term: String::new(),
            root_path: default_root_path(),
            buffer_size: default_buffer_size(),
            worker_count: default_worker_count(),
            mode: ScanMode::default(),
            ignore_patterns: Vec::new(),
            file_extensions: None,
            respect_ignore_files: false,
            log_level: default_log_level(),
        }
    }
}

impl ScanConfig {
    /// Loads configuration from the default locations plus a specific file.
    ///
    /// An explicitly given file must exist.
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("offsetscout/config.yaml")),
            Some(PathBuf::from(".offsetscout.yaml")),
        ];
        for path in defaults.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(term) = cli.term {
            self.term = term;
        }
        if let Some(root) = cli.root_path {
            self.root_path = root;
        }
        if let Some(size) = cli.buffer_size {
            self.buffer_size = size;
        }
        if let Some(workers) = cli.worker_count {
            self.worker_count = workers;
        }
        if let Some(mode) = cli.mode {
            self.mode = mode;
        }
        if !cli.ignore_patterns.is_empty() {
            self.ignore_patterns = cli.ignore_patterns;
        }
        if cli.file_extensions.is_some() {
            self.file_extensions = cli.file_extensions;
        }
        if cli.respect_ignore_files {
            self.respect_ignore_files = true;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    /// Traversal filters for this configuration
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            ignore_patterns: self.ignore_patterns.clone(),
            file_extensions: self.file_extensions.clone(),
            respect_ignore_files: self.respect_ignore_files,
        }
    }
}
