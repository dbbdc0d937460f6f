use glob::Pattern;
use ignore::{Walk, WalkBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::errors::{SearchError, SearchResult};
use crate::filters::{compile_patterns, should_include_file};

/// Controls which entries a walk yields.
///
/// The default visits every file under the root: hidden files and
/// files matched by `.gitignore`/`.ignore` are included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkOptions {
    /// Glob patterns, matched against paths relative to the root
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Only scan files with one of these extensions
    #[serde(default)]
    pub file_extensions: Option<Vec<String>>,

    /// Honour hidden-file, `.gitignore` and `.ignore` rules
    #[serde(default)]
    pub respect_ignore_files: bool,
}

/// Enumerates the non-directory entries under a root.
///
/// Directories are skipped, including symlinks that resolve to one; those are
/// never descended into. Every other entry is yielded: regular files, links to
/// regular files, broken links and special files, so the scanner can report
/// the ones it cannot read. Each enumeration failure is surfaced once as
/// [`SearchError::Traversal`]; callers treat it as fatal and stop iterating.
pub struct FileWalk {
    root: PathBuf,
    inner: Walk,
    extensions: Option<Vec<String>>,
    ignore_patterns: Vec<Pattern>,
}

impl WalkOptions {
    /// Rejects malformed ignore patterns without touching the filesystem.
    pub fn validate(&self) -> SearchResult<()> {
        self.compiled_patterns().map(|_| ())
    }

    fn compiled_patterns(&self) -> SearchResult<Vec<Pattern>> {
        compile_patterns(&self.ignore_patterns)
            .map_err(|e| SearchError::config_error(format!("invalid ignore pattern: {}", e)))
    }
}

/// Starts a walk of `root`. No I/O happens until the first call to `next`.
pub fn walk_files(root: &Path, options: &WalkOptions) -> SearchResult<FileWalk> {
    let ignore_patterns = options.compiled_patterns()?;

    let respect = options.respect_ignore_files;
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(respect)
        .ignore(respect)
        .parents(respect)
        .git_ignore(respect)
        .git_global(respect)
        .git_exclude(respect)
        .follow_links(false);

    Ok(FileWalk {
        root: root.to_path_buf(),
        inner: builder.build(),
        extensions: options.file_extensions.clone(),
        ignore_patterns,
    })
}

impl Iterator for FileWalk {
    type Item = SearchResult<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(SearchError::traversal(e))),
            };

            if is_directory(&entry) {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            if !should_include_file(relative, &self.extensions, &self.ignore_patterns) {
                trace!("Skipping filtered file: {}", path.display());
                continue;
            }

            return Some(Ok(entry.into_path()));
        }
    }
}

fn is_directory(entry: &ignore::DirEntry) -> bool {
    match entry.file_type() {
        Some(ft) if ft.is_dir() => true,
        // A dangling link is not a directory; the scanner reports it.
        Some(ft) if ft.is_symlink() => fs::metadata(entry.path()).is_ok_and(|md| md.is_dir()),
        Some(_) => false,
        // Only stdin lacks a file type.
        None => true,
    }
}
