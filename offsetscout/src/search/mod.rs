/// Byte-offset search over a directory tree.
///
/// Two engines share the same per-file routine, [`scanner::scan_file`]:
///
/// 1. **Serial** ([`serial_scan`]): walks the tree and scans files one at a
///    time, in traversal order. The first error of any kind aborts the call.
///
/// 2. **Parallel** ([`parallel_scan`]): a producer thread walks the tree and
///    fans paths out to a fixed pool of workers; outcomes fan back in to a
///    collector on the calling thread, which alone owns the result set.
///    Per-file errors are collected and the remaining files still scanned.
///
/// Over the same tree, term and buffer size, and with no failing files, both
/// engines return the same `(path, offsets)` pairs:
/// ```rust,ignore
/// let serial = serial_scan(root, b"create", 1024)?;
/// let parallel = parallel_scan(root, b"create", 1024, 10)?;
/// ```
///
/// # Memory
///
/// Files are never read whole. Each open file costs one buffer of
/// `buffer_size + term.len() - 1` bytes, and at most `worker_count` files are
/// open at once.
pub mod parallel;
pub mod scanner;
pub mod serial;

pub use parallel::{parallel_scan, parallel_scan_with};
pub use scanner::{scan_file, scan_file_with_stats, validate_scan_params, FileScan};
pub use serial::{serial_scan, serial_scan_with};

use tracing::debug;

use crate::config::{ScanConfig, ScanMode};
use crate::errors::SearchResult;
use crate::results::ScanOutcome;

/// Runs the engine selected by `config.mode`
pub fn scan(config: &ScanConfig) -> SearchResult<ScanOutcome> {
    let options = config.walk_options();
    let term = config.term.as_bytes();
    debug!("Scan configuration: {:?}", config);

    match config.mode {
        ScanMode::Serial => {
            serial_scan_with(&config.root_path, term, config.buffer_size.get(), &options)
        }
        ScanMode::Parallel => parallel_scan_with(
            &config.root_path,
            term,
            config.buffer_size.get(),
            config.worker_count.get(),
            &options,
        ),
    }
}
