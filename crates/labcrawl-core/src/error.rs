//! Error types for tree construction, parameter lookup and crawling.

use std::path::PathBuf;

use thiserror::Error;

/// Structural errors that abort a tree build.
///
/// A build that fails with one of these returns no tree at all. Directories
/// renamed before the failure stay renamed.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A level rule carries a pattern that is not a valid glob.
    #[error("Invalid pattern '{pattern}' for level '{level}': {source}")]
    InvalidPattern {
        level: String,
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Renaming a directory during normalization failed.
    #[error("Failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Normalization would rename a directory onto an existing entry.
    #[error("Cannot rename {from}: {to} already exists")]
    RenameCollision { from: PathBuf, to: PathBuf },

    /// A directory filter failed.
    #[error("Filter failed for {path}: {message}")]
    Filter { path: PathBuf, message: String },

    /// A directory preprocessing step failed.
    #[error("Preprocessing failed for {path}: {message}")]
    Preprocess { path: PathBuf, message: String },
}

impl BuildError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Errors from looking up per-directory experiment parameters.
///
/// These are enrichment failures: the builder logs them and keeps going.
#[derive(Debug, Error)]
pub enum ParamError {
    /// Reading a parameter file failed.
    #[error("Cannot read parameters at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A parameter file is not valid JSON.
    #[error("Cannot parse parameters at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Parameters were found but are unusable.
    #[error("Invalid parameters: {message}")]
    Invalid { message: String },
}

/// A serialized tree whose links do not describe a forest.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A root or child id points past the end of the node list.
    #[error("Node id {id} is out of range")]
    DanglingId { id: usize },

    /// A node is reachable through more than one link, or from itself.
    #[error("Node {id} is linked more than once")]
    Revisited { id: usize },

    /// A node's `parent` disagrees with where it is listed.
    #[error("Node {id} is listed under {listed_under:?} but its parent is {parent:?}")]
    ParentMismatch {
        id: usize,
        listed_under: Option<usize>,
        parent: Option<usize>,
    },

    /// Some nodes cannot be reached from any root.
    #[error("{count} nodes are not reachable from a root")]
    Unreachable { count: usize },
}

/// Errors that abort a crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// I/O error while listing files or writing kernel output.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A kernel returned a file pattern that is not a valid glob.
    #[error("Invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A kernel hook failed.
    #[error("Kernel '{kernel}' failed: {message}")]
    Kernel { kernel: String, message: String },

    /// Serializing kernel output failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CrawlError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a kernel failure.
    pub fn kernel(kernel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Kernel {
            kernel: kernel.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_io() {
        let err = BuildError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, BuildError::PermissionDenied { .. }));

        let err = BuildError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(matches!(err, BuildError::NotFound { .. }));

        let err = BuildError::io("/test/path", std::io::Error::other("boom"));
        assert!(matches!(err, BuildError::Io { .. }));
    }

    #[test]
    fn test_crawl_error_kernel() {
        let err = CrawlError::kernel("summary", "bad row");
        assert_eq!(err.to_string(), "Kernel 'summary' failed: bad row");
    }
}
