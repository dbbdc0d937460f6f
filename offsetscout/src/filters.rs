/// Path filters applied during traversal.
///
/// Both filters are opt-in: with no extensions and no ignore patterns every
/// regular file the walk yields is scanned.
use glob::Pattern;
use std::path::Path;

/// Checks if a file should be included based on its extension
pub fn has_valid_extension(path: &Path, extensions: &Option<Vec<String>>) -> bool {
    match extensions {
        None => true,
        Some(exts) => {
            if let Some(ext) = path.extension() {
                if let Some(ext_str) = ext.to_str() {
                    return exts.iter().any(|e| e.eq_ignore_ascii_case(ext_str));
                }
            }
            false
        }
    }
}

/// Checks if a path matches any of the glob ignore patterns
pub fn should_ignore(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    // Patterns are written with forward slashes on every platform
    let normalized_path = path.to_string_lossy().replace('\\', "/");
    patterns.iter().any(|p| p.matches(&normalized_path))
}

/// Compiles glob ignore patterns, rejecting malformed ones
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, glob::PatternError> {
    patterns.iter().map(|p| Pattern::new(p)).collect()
}

/// Determines if a file should be scanned
pub fn should_include_file(
    path: &Path,
    extensions: &Option<Vec<String>>,
    ignore_patterns: &[Pattern],
) -> bool {
    has_valid_extension(path, extensions) && !should_ignore(path, ignore_patterns)
}
