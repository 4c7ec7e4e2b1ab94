//! JSON manifest of every node in the hierarchy.

use std::fs;
use std::iter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use labcrawl_core::{CrawlError, NodeRef, Payload};

use crate::context::CrawlContext;
use crate::kernel::Kernel;

/// Default manifest file name, relative to the project directory.
pub const DEFAULT_MANIFEST_NAME: &str = "labcrawl_manifest.json";

const KERNEL_NAME: &str = "manifest";

/// One node in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    /// Names from the root down to this node, joined with `/`.
    pub key: String,
    pub level: String,
    pub name: String,
    pub path: PathBuf,
    /// Level name to node name, outermost first, including this node.
    pub ancestors: IndexMap<String, String>,
    pub payload: Payload,
    /// Matched files, in name order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<PathBuf>,
}

impl ManifestRecord {
    fn from_node(node: NodeRef<'_>) -> Self {
        let mut lineage: Vec<NodeRef<'_>> = iter::successors(Some(node), |n| n.parent()).collect();
        lineage.reverse();

        Self {
            key: lineage.iter().map(|n| n.name()).join("/"),
            level: node.level().to_string(),
            name: node.name().to_string(),
            path: node.path().to_path_buf(),
            ancestors: lineage
                .iter()
                .map(|n| (n.level().to_string(), n.name().to_string()))
                .collect(),
            payload: node.payload().clone(),
            files: Vec::new(),
        }
    }
}

/// The file written by [`ManifestKernel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub project_dir: PathBuf,
    pub records: Vec<ManifestRecord>,
}

/// Collects a record per node and writes them as a manifest at project end.
///
/// An existing manifest is replaced only when the crawl runs with
/// `overwrite`; otherwise it is left alone and a warning is logged.
#[derive(Debug)]
pub struct ManifestKernel {
    file_name: String,
    file_pattern: Option<String>,
    records: Vec<ManifestRecord>,
    written: Option<PathBuf>,
}

impl Default for ManifestKernel {
    fn default() -> Self {
        Self::new(DEFAULT_MANIFEST_NAME)
    }
}

impl ManifestKernel {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_pattern: None,
            records: Vec::new(),
            written: None,
        }
    }

    /// List files matching `pattern` in each record.
    pub fn with_files(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = Some(pattern.into());
        self
    }

    pub fn records(&self) -> &[ManifestRecord] {
        &self.records
    }

    /// Where the manifest was written by the last crawl, if it was.
    pub fn written(&self) -> Option<&Path> {
        self.written.as_deref()
    }
}

impl Kernel for ManifestKernel {
    fn name(&self) -> &str {
        KERNEL_NAME
    }

    fn on_project_start(
        &mut self,
        _ctx: &CrawlContext<'_>,
        _roots: &[NodeRef<'_>],
    ) -> Result<(), CrawlError> {
        self.records.clear();
        self.written = None;
        Ok(())
    }

    fn on_node(&mut self, _ctx: &CrawlContext<'_>, node: NodeRef<'_>) -> Result<(), CrawlError> {
        self.records.push(ManifestRecord::from_node(node));
        Ok(())
    }

    fn file_pattern(&self, _node: NodeRef<'_>) -> Option<&str> {
        self.file_pattern.as_deref()
    }

    fn on_file(
        &mut self,
        _ctx: &CrawlContext<'_>,
        node: NodeRef<'_>,
        file: &Path,
    ) -> Result<(), CrawlError> {
        // Files always follow their node's on_node.
        let Some(record) = self
            .records
            .last_mut()
            .filter(|record| record.path == node.path())
        else {
            return Err(CrawlError::kernel(
                KERNEL_NAME,
                format!("file {} arrived without its node", file.display()),
            ));
        };
        record.files.push(file.to_path_buf());
        Ok(())
    }

    fn on_project_end(
        &mut self,
        ctx: &CrawlContext<'_>,
        _roots: &[NodeRef<'_>],
    ) -> Result<(), CrawlError> {
        let target = ctx.project_dir().join(&self.file_name);

        if target.exists() && !ctx.overwrite() {
            tracing::warn!(path = %target.display(), "manifest exists, not overwriting");
            ctx.params().log_warn(&format!(
                "Manifest already exists, skipped: {}",
                target.display()
            ));
            return Ok(());
        }

        let manifest = Manifest {
            generated_at: Utc::now(),
            project_dir: ctx.project_dir().to_path_buf(),
            records: self.records.clone(),
        };
        let json = serde_json::to_string_pretty(&manifest)?;
        fs::write(&target, json).map_err(|e| CrawlError::io(&target, e))?;

        tracing::info!(path = %target.display(), records = self.records.len(), "manifest written");
        self.written = Some(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization_skips_empty_files() {
        let record = ManifestRecord {
            key: "cond_A/mouse_1".into(),
            level: "mouse".into(),
            name: "mouse_1".into(),
            path: PathBuf::from("/prj/cond_A/mouse_1"),
            ancestors: IndexMap::from([
                ("cond".to_string(), "cond_A".to_string()),
                ("mouse".to_string(), "mouse_1".to_string()),
            ]),
            payload: Payload::new(),
            files: Vec::new(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("files").is_none());
        assert_eq!(value["ancestors"]["cond"], "cond_A");

        let back: ManifestRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_default_file_name() {
        let kernel = ManifestKernel::default();
        assert_eq!(kernel.file_name, DEFAULT_MANIFEST_NAME);
        assert!(kernel.written().is_none());
    }
}
