use anyhow::Result;
use offsetscout::{parallel_scan, serial_scan, ScanOutcome, SearchError};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const TERM: &str = "create";
/// Where "create" sits in tests/testdata/example.log
const EXAMPLE_OFFSET: u64 = 292;

fn example_log() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/testdata/example.log")
}

/// Copies the example log `n` times into a fresh directory
fn create_test_files(n: usize) -> Result<TempDir> {
    let dir = tempdir()?;
    for i in 0..n {
        fs::copy(example_log(), dir.path().join(format!("{}-example.log", i)))?;
    }
    Ok(dir)
}

/// Reads `term.len()` bytes at every reported offset and checks they spell
/// the term, and that offsets are strictly ascending.
fn verify_scan_results(outcome: &ScanOutcome, term: &[u8]) -> Result<()> {
    for result in &outcome.file_results {
        assert!(
            result.offsets.windows(2).all(|w| w[0] < w[1]),
            "offsets not ascending for {}",
            result.path.display()
        );
        let mut file = File::open(&result.path)?;
        for &offset in &result.offsets {
            let mut actual = vec![0u8; term.len()];
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut actual)?;
            assert_eq!(actual, term, "at offset {} of {}", offset, result.path.display());
        }
    }
    Ok(())
}

fn as_map(outcome: &ScanOutcome) -> BTreeMap<PathBuf, Vec<u64>> {
    outcome
        .file_results
        .iter()
        .map(|r| (r.path.clone(), r.offsets.clone()))
        .collect()
}

#[test]
fn test_serial_scan() -> Result<()> {
    let file_count = 10;
    let dir = create_test_files(file_count)?;

    let outcome = serial_scan(dir.path(), TERM.as_bytes(), 1024)?;
    assert!(outcome.combined_error().is_none());
    assert_eq!(outcome.file_results.len(), file_count);
    for result in &outcome.file_results {
        assert_eq!(result.offsets, vec![EXAMPLE_OFFSET]);
    }
    verify_scan_results(&outcome, TERM.as_bytes())
}

#[test]
fn test_parallel_scan() -> Result<()> {
    let err = parallel_scan(
        Path::new("shoulderrordirnotexist"),
        TERM.as_bytes(),
        1024,
        10,
    )
    .unwrap_err();
    assert!(matches!(err, SearchError::Traversal { .. }));

    let file_count = 10;
    let dir = create_test_files(file_count)?;
    let outcome = parallel_scan(dir.path(), TERM.as_bytes(), 1024, 10)?;
    assert!(outcome.combined_error().is_none());
    assert_eq!(outcome.file_results.len(), file_count);
    for result in &outcome.file_results {
        assert_eq!(result.offsets, vec![EXAMPLE_OFFSET]);
    }
    verify_scan_results(&outcome, TERM.as_bytes())
}

#[test]
fn test_serial_and_parallel_agree() -> Result<()> {
    let dir = create_test_files(12)?;
    fs::create_dir_all(dir.path().join("nested/deeper"))?;
    fs::write(dir.path().join("nested/none.log"), "no matches in here")?;
    fs::write(
        dir.path().join("nested/deeper/many.log"),
        "create".repeat(40) + "createcreate",
    )?;
    fs::write(dir.path().join("empty.log"), "")?;

    for buffer_size in [6, 7, 64, 1024] {
        let serial = serial_scan(dir.path(), TERM.as_bytes(), buffer_size)?;
        for workers in [1, 3, 8] {
            let parallel = parallel_scan(dir.path(), TERM.as_bytes(), buffer_size, workers)?;
            assert_eq!(as_map(&serial), as_map(&parallel));
        }
        verify_scan_results(&serial, TERM.as_bytes())?;
    }

    let serial = serial_scan(dir.path(), TERM.as_bytes(), 1024)?;
    let map = as_map(&serial);
    assert!(map[&dir.path().join("nested/none.log")].is_empty());
    assert!(map[&dir.path().join("empty.log")].is_empty());
    assert_eq!(map[&dir.path().join("nested/deeper/many.log")].len(), 42);
    Ok(())
}

#[test]
fn test_straddling_matches_survive_small_buffers() -> Result<()> {
    let dir = tempdir()?;
    let mut content = Vec::new();
    for i in 0..300 {
        content.extend_from_slice(format!("{:>5} op=create\n", i).as_bytes());
    }
    fs::write(dir.path().join("big.log"), &content)?;

    let single_pass = serial_scan(dir.path(), TERM.as_bytes(), content.len())?;
    assert_eq!(single_pass.stats.total_matches, 300);
    for buffer_size in [6, 7, 11, 16, 100] {
        let chunked = parallel_scan(dir.path(), TERM.as_bytes(), buffer_size, 2)?;
        assert_eq!(as_map(&single_pass), as_map(&chunked), "buffer {}", buffer_size);
    }

    let single_byte = serial_scan(dir.path(), b"=", 1)?;
    assert_eq!(single_byte.stats.total_matches, 300);
    verify_scan_results(&single_byte, b"=")
}

#[test]
fn test_repeated_scans_are_identical() -> Result<()> {
    let dir = create_test_files(20)?;
    let first = parallel_scan(dir.path(), TERM.as_bytes(), 128, 4)?;
    for _ in 0..5 {
        let again = parallel_scan(dir.path(), TERM.as_bytes(), 128, 4)?;
        assert_eq!(as_map(&first), as_map(&again));
    }
    Ok(())
}

#[test]
fn test_serial_missing_root() {
    let err = serial_scan(Path::new("shoulderrordirnotexist"), TERM.as_bytes(), 1024).unwrap_err();
    assert!(matches!(err, SearchError::Traversal { .. }));
}

#[test]
fn test_configuration_errors() {
    let dir = tempdir().unwrap();
    for (term, buffer) in [(&b""[..], 16), (&b"create"[..], 0), (&b"create"[..], 5)] {
        assert!(matches!(
            serial_scan(dir.path(), term, buffer),
            Err(SearchError::ConfigError(_))
        ));
        assert!(matches!(
            parallel_scan(dir.path(), term, buffer, 2),
            Err(SearchError::ConfigError(_))
        ));
    }
}

#[cfg(unix)]
#[test]
fn test_unreadable_file() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let file_count = 6;
    let dir = create_test_files(file_count)?;
    let locked = dir.path().join("3-example.log");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

    // Privileged users can read it anyway; nothing to test then.
    if File::open(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644))?;
        return Ok(());
    }

    let outcome = parallel_scan(dir.path(), TERM.as_bytes(), 1024, 3)?;
    assert_eq!(outcome.file_results.len(), file_count - 1);
    assert_eq!(outcome.file_errors.len(), 1);
    assert_eq!(outcome.file_errors[0].path, locked);
    assert!(matches!(outcome.file_errors[0].error, SearchError::Open { .. }));
    let combined = outcome.combined_error().expect("combined error");
    assert!(combined.to_string().contains("3-example.log"));
    assert!(outcome.offsets_for(&locked).is_none());

    let err = serial_scan(dir.path(), TERM.as_bytes(), 1024).unwrap_err();
    assert!(matches!(err, SearchError::Open { .. }));
    assert_eq!(err.path(), Some(locked.as_path()));

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_dangling_link_among_files() -> Result<()> {
    use std::os::unix::fs::symlink;

    let file_count = 6;
    let dir = create_test_files(file_count)?;
    let dangling = dir.path().join("dangling.log");
    symlink(dir.path().join("removed.log"), &dangling)?;

    let outcome = parallel_scan(dir.path(), TERM.as_bytes(), 1024, 3)?;
    assert_eq!(outcome.file_results.len(), file_count);
    assert_eq!(outcome.file_errors.len(), 1);
    assert_eq!(outcome.file_errors[0].path, dangling);
    assert!(matches!(outcome.file_errors[0].error, SearchError::Open { .. }));
    let combined = outcome.combined_error().expect("combined error");
    assert_eq!(combined.messages().len(), 1);
    assert!(combined.to_string().contains("dangling.log"));
    verify_scan_results(&outcome, TERM.as_bytes())?;

    let err = serial_scan(dir.path(), TERM.as_bytes(), 1024).unwrap_err();
    assert!(matches!(err, SearchError::Open { .. }));
    assert_eq!(err.path(), Some(dangling.as_path()));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_fatal() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = create_test_files(3)?;
    let sealed = dir.path().join("sealed");
    fs::create_dir(&sealed)?;
    fs::write(sealed.join("inside.log"), "create")?;
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o000))?;

    if fs::read_dir(&sealed).is_ok() {
        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755))?;
        return Ok(());
    }

    let err = parallel_scan(dir.path(), TERM.as_bytes(), 1024, 2).unwrap_err();
    assert!(matches!(err, SearchError::Traversal { .. }));
    let err = serial_scan(dir.path(), TERM.as_bytes(), 1024).unwrap_err();
    assert!(matches!(err, SearchError::Traversal { .. }));

    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755))?;
    Ok(())
}
