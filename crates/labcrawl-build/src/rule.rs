//! Per-level discovery rules.

use std::fmt;
use std::path::{Path, PathBuf};

use compact_str::CompactString;

use labcrawl_core::{BuildError, ParamError, Payload, ProjectParams};

/// Decides whether a candidate directory becomes a node.
pub type DirFilter = Box<dyn Fn(&Path) -> Result<bool, BuildError>>;

/// Normalizes a directory, possibly renaming it, and returns its final path.
pub type DirPreprocess = Box<dyn Fn(&Path, &dyn ProjectParams) -> Result<PathBuf, BuildError>>;

/// Produces the payload for a directory.
pub type PayloadLoader = Box<dyn Fn(&Path, &dyn ProjectParams) -> Result<Payload, ParamError>>;

/// How directories at one depth of the hierarchy are discovered.
///
/// A fresh rule matches every directory accepted by [`basic_dir_filter`],
/// leaves it in place and attaches an empty payload.
pub struct LevelRule {
    level: CompactString,
    pattern: String,
    filter_dir: DirFilter,
    preprocess_dir: DirPreprocess,
    load_payload: PayloadLoader,
}

impl LevelRule {
    /// Create a rule for `level` matching child names against `pattern`.
    pub fn new(level: impl Into<CompactString>, pattern: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            pattern: pattern.into(),
            filter_dir: Box::new(basic_dir_filter),
            preprocess_dir: Box::new(|dir: &Path, _: &dyn ProjectParams| Ok(dir.to_path_buf())),
            load_payload: Box::new(|_: &Path, _: &dyn ProjectParams| Ok(Payload::new())),
        }
    }

    /// Replace the directory filter.
    pub fn with_filter(
        mut self,
        filter: impl Fn(&Path) -> Result<bool, BuildError> + 'static,
    ) -> Self {
        self.filter_dir = Box::new(filter);
        self
    }

    /// Replace the normalization step.
    pub fn with_preprocess(
        mut self,
        preprocess: impl Fn(&Path, &dyn ProjectParams) -> Result<PathBuf, BuildError> + 'static,
    ) -> Self {
        self.preprocess_dir = Box::new(preprocess);
        self
    }

    /// Replace the payload loader.
    pub fn with_payload(
        mut self,
        loader: impl Fn(&Path, &dyn ProjectParams) -> Result<Payload, ParamError> + 'static,
    ) -> Self {
        self.load_payload = Box::new(loader);
        self
    }

    pub fn level(&self) -> &str {
        self.level.as_str()
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn filter_dir(&self, dir: &Path) -> Result<bool, BuildError> {
        (self.filter_dir)(dir)
    }

    pub fn preprocess_dir(
        &self,
        dir: &Path,
        params: &dyn ProjectParams,
    ) -> Result<PathBuf, BuildError> {
        (self.preprocess_dir)(dir, params)
    }

    pub fn load_payload(&self, dir: &Path, params: &dyn ProjectParams) -> Result<Payload, ParamError> {
        (self.load_payload)(dir, params)
    }
}

impl fmt::Debug for LevelRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelRule")
            .field("level", &self.level)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// Accept directories unless their name starts with `_` or `@`.
pub fn basic_dir_filter(dir: &Path) -> Result<bool, BuildError> {
    if !dir.is_dir() {
        return Ok(false);
    }
    let ignored = dir
        .file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            name.starts_with('_') || name.starts_with('@')
        })
        .unwrap_or(true);
    Ok(!ignored)
}
