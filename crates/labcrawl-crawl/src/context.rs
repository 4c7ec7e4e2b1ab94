//! Run-scoped state shared with every kernel.

use std::fmt;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use labcrawl_core::ProjectParams;

/// Options for one crawl.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct CrawlOptions {
    /// Project root; kernels write their output under it.
    pub project_dir: PathBuf,

    /// Replace existing kernel output.
    #[builder(default = "false")]
    pub overwrite: bool,
}

impl CrawlOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        match &self.project_dir {
            Some(dir) if dir.as_os_str().is_empty() => {
                Err("Project directory cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Project directory is required".to_string()),
        }
    }
}

impl CrawlOptions {
    /// Create a new options builder.
    pub fn builder() -> CrawlOptionsBuilder {
        CrawlOptionsBuilder::default()
    }

    /// Options for a project without overwriting.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            overwrite: false,
        }
    }
}

/// Immutable context passed to every kernel hook during one crawl.
#[derive(Clone, Copy)]
pub struct CrawlContext<'a> {
    params: &'a dyn ProjectParams,
    project_dir: &'a Path,
    overwrite: bool,
}

impl<'a> CrawlContext<'a> {
    pub fn new(params: &'a dyn ProjectParams, project_dir: &'a Path, overwrite: bool) -> Self {
        Self {
            params,
            project_dir,
            overwrite,
        }
    }

    /// Shared project parameters.
    pub fn params(&self) -> &'a dyn ProjectParams {
        self.params
    }

    pub fn project_dir(&self) -> &'a Path {
        self.project_dir
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }
}

impl fmt::Debug for CrawlContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlContext")
            .field("project_dir", &self.project_dir)
            .field("overwrite", &self.overwrite)
            .finish_non_exhaustive()
    }
}
