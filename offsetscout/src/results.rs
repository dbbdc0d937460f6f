/// Result types and the outcome aggregator.
///
/// Each scanned file ends up as exactly one [`FileOutcome`]: a [`FileResult`]
/// with its offsets, or a [`FileError`]. The [`Aggregator`] folds those into a
/// [`ScanOutcome`], the only value a scan call hands back. It is owned by a
/// single thread (the caller of the serial engine, the collector of the
/// parallel one), so nothing in here needs synchronisation.
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

use crate::errors::{SearchError, SearchResult};
use crate::metrics::ScanStats;
use crate::search::scanner::FileScan;

/// All match offsets found in a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResult {
    /// The path to the file
    pub path: PathBuf,
    /// Byte offsets where the term begins, ascending
    pub offsets: Vec<u64>,
}

/// A file that could not be opened or read
#[derive(Debug)]
pub struct FileError {
    /// The path to the file
    pub path: PathBuf,
    /// What went wrong
    pub error: SearchError,
}

/// What one worker reports for one file
#[derive(Debug)]
pub enum FileOutcome {
    Success { result: FileResult, bytes_read: u64 },
    Failure(FileError),
}

impl FileOutcome {
    /// Wraps the scanner's return value for `path`
    pub fn from_scan(path: PathBuf, scan: SearchResult<FileScan>) -> Self {
        match scan {
            Ok(scan) => FileOutcome::Success {
                result: FileResult {
                    path,
                    offsets: scan.offsets,
                },
                bytes_read: scan.bytes_read,
            },
            Err(error) => FileOutcome::Failure(FileError { path, error }),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            FileOutcome::Success { result, .. } => &result.path,
            FileOutcome::Failure(failure) => &failure.path,
        }
    }
}

/// Every per-file error of a call, rendered as one message.
///
/// Messages keep the order in which the errors were recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .messages.join("; "))]
pub struct CombinedError {
    messages: Vec<String>,
}

impl CombinedError {
    /// The individual messages, in recording order
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

/// The complete result of one scan call
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// One entry per successfully scanned file
    pub file_results: Vec<FileResult>,
    /// One entry per file that failed, in arrival order
    pub file_errors: Vec<FileError>,
    /// Counters for the call
    pub stats: ScanStats,
}

impl ScanOutcome {
    /// Creates an empty outcome
    pub fn new() -> Self {
        Default::default()
    }

    /// Summary of all per-file errors, or `None` when every file succeeded
    pub fn combined_error(&self) -> Option<CombinedError> {
        if self.file_errors.is_empty() {
            return None;
        }
        Some(CombinedError {
            messages: self
                .file_errors
                .iter()
                .map(|e| e.error.to_string())
                .collect(),
        })
    }

    /// Offsets for `path`, if it was scanned successfully
    pub fn offsets_for(&self, path: &std::path::Path) -> Option<&[u64]> {
        self.file_results
            .iter()
            .find(|r| r.path == path)
            .map(|r| r.offsets.as_slice())
    }

    /// Results ordered by path, for stable presentation
    pub fn sorted_results(&self) -> Vec<&FileResult> {
        let mut results: Vec<&FileResult> = self.file_results.iter().collect();
        results.sort_by(|a, b| a.path.cmp(&b.path));
        results
    }
}

/// Incrementally folds per-file outcomes into a [`ScanOutcome`].
#[derive(Debug)]
pub struct Aggregator {
    outcome: ScanOutcome,
    started: Instant,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            outcome: ScanOutcome::new(),
            started: Instant::now(),
        }
    }

    /// Records one file's outcome
    pub fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Success { result, bytes_read } => {
                self.outcome
                    .stats
                    .record_success(result.offsets.len(), bytes_read);
                self.outcome.file_results.push(result);
            }
            FileOutcome::Failure(failure) => {
                self.outcome.stats.record_failure();
                self.outcome.file_errors.push(failure);
            }
        }
    }

    /// Number of outcomes recorded so far
    pub fn recorded(&self) -> u64 {
        self.outcome.stats.files_discovered
    }

    /// Stamps the elapsed time and returns the outcome
    pub fn finish(mut self) -> ScanOutcome {
        self.outcome.stats.elapsed = self.started.elapsed();
        self.outcome
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Folds a sequence of per-file outcomes into one [`ScanOutcome`]
pub fn aggregate<I>(outcomes: I) -> ScanOutcome
where
    I: IntoIterator<Item = FileOutcome>,
{
    let mut aggregator = Aggregator::new();
    for outcome in outcomes {
        aggregator.record(outcome);
    }
    aggregator.finish()
}
