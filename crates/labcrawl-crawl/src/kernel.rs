//! The kernel interface implemented by each analysis concern.

use std::path::Path;

use labcrawl_core::{CrawlError, NodeRef};

use crate::context::CrawlContext;

/// A visitor driven by the [`Crawler`](crate::Crawler).
///
/// Every hook has a no-op default, so a kernel only implements the events it
/// cares about. Kernels never see each other; level-specific behavior belongs
/// in `on_node` by looking at [`NodeRef::level`] or [`NodeRef::variant`].
///
/// Any hook returning an error aborts the whole crawl.
pub trait Kernel {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called once before any node is visited.
    fn on_project_start(
        &mut self,
        _ctx: &CrawlContext<'_>,
        _roots: &[NodeRef<'_>],
    ) -> Result<(), CrawlError> {
        Ok(())
    }

    /// Called once per node, depth-first pre-order.
    fn on_node(&mut self, _ctx: &CrawlContext<'_>, _node: NodeRef<'_>) -> Result<(), CrawlError> {
        Ok(())
    }

    /// Glob for files directly inside `node.path()` to feed to [`Kernel::on_file`].
    ///
    /// `None` or an empty pattern skips file processing for this node.
    fn file_pattern(&self, _node: NodeRef<'_>) -> Option<&str> {
        None
    }

    /// Called for each matched file, in name order, right after `on_node`.
    fn on_file(
        &mut self,
        _ctx: &CrawlContext<'_>,
        _node: NodeRef<'_>,
        _file: &Path,
    ) -> Result<(), CrawlError> {
        Ok(())
    }

    /// Called once after every node has been visited.
    fn on_project_end(
        &mut self,
        _ctx: &CrawlContext<'_>,
        _roots: &[NodeRef<'_>],
    ) -> Result<(), CrawlError> {
        Ok(())
    }
}
