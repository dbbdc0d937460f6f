use std::path::Path;
use tracing::{debug, info};

use super::scanner::{scan_file_with_stats, validate_scan_params};
use crate::errors::SearchResult;
use crate::results::{Aggregator, FileOutcome, ScanOutcome};
use crate::walk::{walk_files, WalkOptions};

/// Scans every file under `root`, one file at a time.
///
/// Files are processed in traversal order. The first traversal error or
/// per-file error aborts the call and is returned as-is; no partial outcome
/// is produced.
pub fn serial_scan(root: &Path, term: &[u8], buffer_size: usize) -> SearchResult<ScanOutcome> {
    serial_scan_with(root, term, buffer_size, &WalkOptions::default())
}

/// [`serial_scan`] with traversal filters.
pub fn serial_scan_with(
    root: &Path,
    term: &[u8],
    buffer_size: usize,
    options: &WalkOptions,
) -> SearchResult<ScanOutcome> {
    validate_scan_params(term, buffer_size)?;
    info!(
        "Starting serial scan of {} for {} byte term",
        root.display(),
        term.len()
    );

    let mut aggregator = Aggregator::new();
    for entry in walk_files(root, options)? {
        let path = entry?;
        let scan = scan_file_with_stats(&path, term, buffer_size)?;
        debug!("{}: {} matches", path.display(), scan.offsets.len());
        aggregator.record(FileOutcome::from_scan(path, Ok(scan)));
    }

    let outcome = aggregator.finish();
    outcome.stats.log_stats();
    info!(
        "Serial scan complete. Found {} matches in {} files",
        outcome.stats.total_matches, outcome.stats.files_with_matches
    );
    Ok(outcome)
}
