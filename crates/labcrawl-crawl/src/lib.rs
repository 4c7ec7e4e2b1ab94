//! Multi-kernel crawling of experiment hierarchies.
//!
//! A [`Crawler`] walks a [`HierTree`] depth-first and feeds the same event
//! stream to every registered [`Kernel`]:
//!
//! 1. `on_project_start` once per kernel, in registration order.
//! 2. For each node in pre-order, every kernel gets `on_node` followed by
//!    `on_file` for each file matching its [`Kernel::file_pattern`].
//! 3. `on_project_end` once per kernel.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use labcrawl_build::{HierarchyKind, Layout, TreeBuilder};
//! use labcrawl_core::NoParams;
//! use labcrawl_crawl::{CrawlOptions, Crawler, LevelSummary};
//!
//! let root = Path::new("/data/project");
//! let tree = TreeBuilder::for_layout(Layout::Behavior)
//!     .build(root, &NoParams, &HierarchyKind::Behavior)?;
//!
//! let mut summary = LevelSummary::new().with_files("*.csv", Some("day"));
//! Crawler::new(vec![&mut summary], &NoParams, CrawlOptions::new(root)).crawl(&tree)?;
//! println!("{}", summary.report());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod context;
mod crawler;
mod kernel;
pub mod kernels;

pub use context::{CrawlContext, CrawlOptions, CrawlOptionsBuilder, CrawlOptionsBuilderError};
pub use crawler::{CrawlStats, Crawler};
pub use kernel::Kernel;
pub use kernels::{LevelSummary, Manifest, ManifestKernel, ManifestRecord, SummaryReport};

pub use labcrawl_core::{CrawlError, HierTree, NodeRef, ProjectParams};
