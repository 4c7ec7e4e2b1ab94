//! Depth-first dispatch of crawl events to a set of kernels.

use std::path::{Path, PathBuf};

use serde::Serialize;

use labcrawl_core::glob::{compile_pattern, list_matching};
use labcrawl_core::{CrawlError, HierTree, NodeRef, ProjectParams};

use crate::context::{CrawlContext, CrawlOptions};
use crate::kernel::Kernel;

/// Counters for one completed crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Nodes walked.
    pub nodes_visited: usize,
    /// `on_node` calls across all kernels.
    pub node_events: usize,
    /// `on_file` calls across all kernels.
    pub files_dispatched: usize,
}

/// Walks a built tree and drives every registered kernel.
///
/// Kernels are called in registration order. For each node, every kernel
/// handles the node and its files before the crawler descends into the
/// node's children. The first hook error stops the crawl for all kernels.
pub struct Crawler<'k> {
    kernels: Vec<&'k mut dyn Kernel>,
    params: &'k dyn ProjectParams,
    options: CrawlOptions,
}

impl<'k> Crawler<'k> {
    /// Create a crawler; `kernels` order is dispatch order.
    pub fn new(
        kernels: Vec<&'k mut dyn Kernel>,
        params: &'k dyn ProjectParams,
        options: CrawlOptions,
    ) -> Self {
        Self {
            kernels,
            params,
            options,
        }
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Run one full crawl over `tree`.
    pub fn crawl(&mut self, tree: &HierTree) -> Result<CrawlStats, CrawlError> {
        let ctx = CrawlContext::new(
            self.params,
            &self.options.project_dir,
            self.options.overwrite,
        );
        let roots: Vec<NodeRef<'_>> = tree.roots().collect();
        let mut stats = CrawlStats::default();

        tracing::info!(
            kernels = self.kernels.len(),
            roots = roots.len(),
            nodes = tree.len(),
            "crawl started"
        );

        for kernel in self.kernels.iter_mut() {
            kernel
                .on_project_start(&ctx, &roots)
                .inspect_err(|err| log_failure(kernel.name(), "on_project_start", err))?;
        }

        for root in &roots {
            walk_node(&mut self.kernels, &ctx, *root, &mut stats)?;
        }

        for kernel in self.kernels.iter_mut() {
            kernel
                .on_project_end(&ctx, &roots)
                .inspect_err(|err| log_failure(kernel.name(), "on_project_end", err))?;
        }

        tracing::info!(
            nodes = stats.nodes_visited,
            files = stats.files_dispatched,
            "crawl finished"
        );
        Ok(stats)
    }
}

fn walk_node(
    kernels: &mut [&mut dyn Kernel],
    ctx: &CrawlContext<'_>,
    node: NodeRef<'_>,
    stats: &mut CrawlStats,
) -> Result<(), CrawlError> {
    stats.nodes_visited += 1;
    tracing::trace!(level = node.level(), path = %node.path().display(), "visiting node");

    for kernel in kernels.iter_mut() {
        kernel
            .on_node(ctx, node)
            .inspect_err(|err| log_failure(kernel.name(), "on_node", err))?;
        stats.node_events += 1;

        let Some(pattern) = kernel
            .file_pattern(node)
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
        else {
            continue;
        };

        for file in matching_files(node.path(), &pattern)? {
            kernel
                .on_file(ctx, node, &file)
                .inspect_err(|err| log_failure(kernel.name(), "on_file", err))?;
            stats.files_dispatched += 1;
        }
    }

    for child in node.children() {
        walk_node(kernels, ctx, child, stats)?;
    }
    Ok(())
}

/// Regular files directly inside `dir` matching `pattern`, sorted by name.
fn matching_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, CrawlError> {
    let matcher = compile_pattern(pattern).map_err(|source| CrawlError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    let mut files = list_matching(dir, &matcher).map_err(|e| CrawlError::io(dir, e))?;
    files.retain(|path| path.is_file());
    Ok(files)
}

fn log_failure(kernel: &str, hook: &str, err: &CrawlError) {
    tracing::error!(kernel, hook, error = %err, "kernel failed, aborting crawl");
}

#[cfg(test)]
mod tests {
    use super::*;
    use labcrawl_core::NoParams;

    #[derive(Default)]
    struct Lifecycle {
        events: Vec<&'static str>,
    }

    impl Kernel for Lifecycle {
        fn on_project_start(
            &mut self,
            _ctx: &CrawlContext<'_>,
            _roots: &[NodeRef<'_>],
        ) -> Result<(), CrawlError> {
            self.events.push("start");
            Ok(())
        }

        fn on_node(&mut self, _ctx: &CrawlContext<'_>, _node: NodeRef<'_>) -> Result<(), CrawlError> {
            self.events.push("node");
            Ok(())
        }

        fn on_project_end(
            &mut self,
            _ctx: &CrawlContext<'_>,
            _roots: &[NodeRef<'_>],
        ) -> Result<(), CrawlError> {
            self.events.push("end");
            Ok(())
        }
    }

    #[test]
    fn test_empty_forest() {
        let tree = HierTree::new();
        let mut first = Lifecycle::default();
        let mut second = Lifecycle::default();

        let stats = Crawler::new(
            vec![&mut first, &mut second],
            &NoParams,
            CrawlOptions::new("/prj"),
        )
        .crawl(&tree)
        .unwrap();

        assert_eq!(stats, CrawlStats::default());
        assert_eq!(first.events, ["start", "end"]);
        assert_eq!(second.events, ["start", "end"]);
    }

    #[test]
    fn test_default_kernel_name() {
        let kernel = Lifecycle::default();
        assert!(kernel.name().ends_with("Lifecycle"));
    }
}
