pub mod config;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod results;
pub mod search;
pub mod walk;

pub use crate::config::{CliOverrides, ScanConfig, ScanMode};
pub use errors::{SearchError, SearchResult};
pub use metrics::ScanStats;
pub use results::{aggregate, CombinedError, FileError, FileOutcome, FileResult, ScanOutcome};
pub use search::{parallel_scan, scan, scan_file, serial_scan};
pub use walk::WalkOptions;
