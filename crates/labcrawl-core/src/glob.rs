//! Shell-glob matching over the immediate entries of a directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

/// Compile a shell glob matched against single file names.
///
/// `*` and `?` never cross a path separator.
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}

/// Entries directly inside `dir` whose name matches, sorted by name.
///
/// Sorting is the only source of ordering; the directory listing order is
/// never relied on.
pub fn list_matching(dir: &Path, matcher: &GlobMatcher) -> io::Result<Vec<PathBuf>> {
    let mut matched = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if matcher.is_match(entry.file_name()) {
            matched.push(entry.path());
        }
    }
    matched.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(matched)
}
