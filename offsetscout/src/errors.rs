/// Error types for offsetscout.
///
/// Errors fall into two groups. Per-file errors (`Open`, `Read`) describe a
/// single file that could not be scanned; the parallel engine records them and
/// keeps going, while the serial engine aborts on the first one. Everything
/// else is fatal to the whole call: a traversal failure, a configuration
/// problem detected before any I/O, or a broken worker pool.
///
/// ```rust,ignore
/// match parallel_scan(root, b"create", 1024, 8) {
///     Ok(outcome) => {
///         if let Some(err) = outcome.combined_error() {
///             eprintln!("some files failed: {}", err);
///         }
///     }
///     Err(SearchError::Traversal { .. }) => // Handle enumeration failure,
///     Err(e) => // Handle other fatal errors
/// }
/// ```
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for scan operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during scan operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Traversal failed at {}: {source}", display_opt(.path))]
    Traversal {
        path: Option<PathBuf>,
        source: ignore::Error,
    },
    #[error("Failed to open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("Failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

fn display_opt(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string())
}

impl SearchError {
    pub fn traversal(source: ignore::Error) -> Self {
        let path = error_path(&source);
        Self::Traversal { path, source }
    }

    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn worker_pool(msg: impl Into<String>) -> Self {
        Self::WorkerPool(msg.into())
    }

    /// True for errors scoped to a single file (open/read failures).
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::Read { .. })
    }

    /// The file or directory the error refers to, when known.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Traversal { path, .. } => path.as_deref(),
            Self::Open { path, .. } | Self::Read { path, .. } => Some(path),
            Self::ConfigError(_) | Self::WorkerPool(_) => None,
        }
    }
}

impl From<config::ConfigError> for SearchError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

/// Digs the offending path out of an `ignore` error, which may be nested.
fn error_path(err: &ignore::Error) -> Option<PathBuf> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.clone()),
        _ => None,
    }
}
