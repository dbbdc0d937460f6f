use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Counters for one scan call.
///
/// Only the aggregator updates these, after each outcome has been handed to
/// it, so plain integers are enough.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Regular files the traversal produced
    pub files_discovered: u64,
    /// Files scanned to completion
    pub files_scanned: u64,
    /// Files that failed to open or read
    pub files_failed: u64,
    /// Files with at least one match
    pub files_with_matches: u64,
    /// Total matches across all files
    pub total_matches: u64,
    /// Bytes read by successful scans
    pub bytes_scanned: u64,
    /// Wall-clock time of the whole call
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl ScanStats {
    pub(crate) fn record_success(&mut self, matches: usize, bytes: u64) {
        self.files_discovered += 1;
        self.files_scanned += 1;
        self.bytes_scanned += bytes;
        if matches > 0 {
            self.files_with_matches += 1;
            self.total_matches += matches as u64;
        }
    }

    pub(crate) fn record_failure(&mut self) {
        self.files_discovered += 1;
        self.files_failed += 1;
    }

    /// Logs the counters at info level
    pub fn log_stats(&self) {
        info!(
            "Scan stats:\n\
             Files discovered/scanned/failed: {}/{}/{}\n\
             Files with matches: {}\n\
             Total matches: {}\n\
             Bytes scanned: {}\n\
             Elapsed: {:?}",
            self.files_discovered,
            self.files_scanned,
            self.files_failed,
            self.files_with_matches,
            self.total_matches,
            self.bytes_scanned,
            self.elapsed
        );
    }
}
