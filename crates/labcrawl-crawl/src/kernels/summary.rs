//! Per-level node and file counts.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use labcrawl_core::{CrawlError, NodeRef};

use crate::context::CrawlContext;
use crate::kernel::Kernel;

/// Counts for one hierarchy level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    /// Nodes at this level.
    pub nodes: usize,
    /// Files matched under nodes at this level.
    pub files: usize,
    /// Payload entries that are `null`, e.g. sessions without parameters.
    pub null_payload_fields: usize,
}

/// Result of a [`LevelSummary`] crawl.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub roots: usize,
    pub total_nodes: usize,
    pub total_files: usize,
    /// Per-level counts in the order levels were first seen.
    pub levels: IndexMap<String, LevelStats>,
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} roots, {} nodes, {} files",
            self.roots, self.total_nodes, self.total_files
        )?;
        let lines = self.levels.iter().format_with("\n", |(level, stats), f| {
            f(&format_args!(
                "  {level:<8} {:>6} nodes {:>6} files {:>4} missing params",
                stats.nodes, stats.files, stats.null_payload_fields
            ))
        });
        write!(f, "{lines}")
    }
}

/// Counts nodes per level and, optionally, files matching a glob.
#[derive(Debug, Default)]
pub struct LevelSummary {
    file_pattern: Option<String>,
    file_level: Option<String>,
    report: SummaryReport,
}

impl LevelSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also count files matching `pattern`, at every level or only at `level`.
    pub fn with_files(mut self, pattern: impl Into<String>, level: Option<&str>) -> Self {
        self.file_pattern = Some(pattern.into());
        self.file_level = level.map(str::to_string);
        self
    }

    pub fn report(&self) -> &SummaryReport {
        &self.report
    }

    pub fn into_report(self) -> SummaryReport {
        self.report
    }
}

impl Kernel for LevelSummary {
    fn name(&self) -> &str {
        "level_summary"
    }

    fn on_project_start(
        &mut self,
        _ctx: &CrawlContext<'_>,
        roots: &[NodeRef<'_>],
    ) -> Result<(), CrawlError> {
        self.report = SummaryReport {
            roots: roots.len(),
            ..SummaryReport::default()
        };
        Ok(())
    }

    fn on_node(&mut self, _ctx: &CrawlContext<'_>, node: NodeRef<'_>) -> Result<(), CrawlError> {
        let stats = self.report.levels.entry(node.level().to_string()).or_default();
        stats.nodes += 1;
        stats.null_payload_fields += node.payload().values().filter(|v| v.is_null()).count();
        self.report.total_nodes += 1;
        Ok(())
    }

    fn file_pattern(&self, node: NodeRef<'_>) -> Option<&str> {
        match &self.file_level {
            Some(level) if level != node.level() => None,
            _ => self.file_pattern.as_deref(),
        }
    }

    fn on_file(
        &mut self,
        _ctx: &CrawlContext<'_>,
        node: NodeRef<'_>,
        _file: &Path,
    ) -> Result<(), CrawlError> {
        self.report.levels.entry(node.level().to_string()).or_default().files += 1;
        self.report.total_files += 1;
        Ok(())
    }

    fn on_project_end(
        &mut self,
        _ctx: &CrawlContext<'_>,
        _roots: &[NodeRef<'_>],
    ) -> Result<(), CrawlError> {
        tracing::debug!(
            nodes = self.report.total_nodes,
            files = self.report.total_files,
            "level summary complete"
        );
        Ok(())
    }
}
