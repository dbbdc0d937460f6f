use memchr::memmem::Finder;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Read};
use std::path::Path;
use tracing::trace;

use crate::errors::{SearchError, SearchResult};

/// Offsets and byte count produced by scanning one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileScan {
    /// Absolute byte offsets where the term starts, ascending
    pub offsets: Vec<u64>,
    /// Number of bytes read from the file
    pub bytes_read: u64,
}

/// Checks the call parameters shared by both engines before any I/O happens.
pub fn validate_scan_params(term: &[u8], buffer_size: usize) -> SearchResult<()> {
    if term.is_empty() {
        return Err(SearchError::config_error("search term must not be empty"));
    }
    if buffer_size == 0 {
        return Err(SearchError::config_error("buffer size must be positive"));
    }
    if term.len() > buffer_size {
        return Err(SearchError::config_error(format!(
            "search term is {} bytes but buffer size is only {}",
            term.len(),
            buffer_size
        )));
    }
    if buffer_size.checked_add(term.len() - 1).is_none() {
        return Err(SearchError::config_error(format!(
            "buffer size {} is too large",
            buffer_size
        )));
    }
    Ok(())
}

/// Returns every offset in `path` where `term` begins.
///
/// The file is read `buffer_size` bytes at a time. The last `term.len() - 1`
/// bytes of each window are carried in front of the next read, so matches that
/// straddle two reads are found, and offsets are absolute within the file.
/// A read failure discards the offsets found so far.
pub fn scan_file(path: &Path, term: &[u8], buffer_size: usize) -> SearchResult<Vec<u64>> {
    scan_file_with_stats(path, term, buffer_size).map(|scan| scan.offsets)
}

/// Same as [`scan_file`] but also reports how many bytes were read.
pub fn scan_file_with_stats(path: &Path, term: &[u8], buffer_size: usize) -> SearchResult<FileScan> {
    validate_scan_params(term, buffer_size)?;
    trace!("Scanning file: {}", path.display());

    // Opening a FIFO would block, so only regular files (or links to them)
    // get as far as `open`.
    let metadata = fs::metadata(path).map_err(|e| SearchError::open(path, e))?;
    if !metadata.is_file() {
        return Err(SearchError::open(
            path,
            io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
        ));
    }
    let mut file = File::open(path).map_err(|e| SearchError::open(path, e))?;
    let scan = scan_reader(&mut file, term, buffer_size).map_err(|e| SearchError::read(path, e))?;

    trace!(
        "Scanned {} bytes of {}, {} matches",
        scan.bytes_read,
        path.display(),
        scan.offsets.len()
    );
    Ok(scan)
}

/// Core buffer walk over any reader.
pub(crate) fn scan_reader<R: Read>(
    reader: &mut R,
    term: &[u8],
    buffer_size: usize,
) -> std::io::Result<FileScan> {
    let finder = Finder::new(term);
    let overlap = term.len() - 1;
    let mut buf = vec![0u8; buffer_size + overlap];

    let mut scan = FileScan::default();
    // Bytes at the front of `buf` held over from the previous window.
    let mut carry = 0usize;
    // File offset of `buf[0]`.
    let mut window_start = 0u64;

    loop {
        let n = match reader.read(&mut buf[carry..carry + buffer_size]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        scan.bytes_read += n as u64;

        let window_len = carry + n;
        let window = &buf[..window_len];

        // Every match start inside the carried prefix needs at least one new
        // byte, so none of these were reported by the previous window.
        let mut pos = 0;
        while let Some(hit) = finder.find(&window[pos..]) {
            let at = pos + hit;
            scan.offsets.push(window_start + at as u64);
            pos = at + 1;
        }

        let next_carry = overlap.min(window_len);
        buf.copy_within(window_len - next_carry..window_len, 0);
        window_start += (window_len - next_carry) as u64;
        carry = next_carry;
    }

    Ok(scan)
}
