//! Core types and traits for labcrawl.
//!
//! This crate provides the data structures shared by the tree builder and the
//! crawler: hierarchy nodes and the arena that owns them, typed node views,
//! project parameters, and error types.

mod config;
mod error;
pub mod glob;
mod node;
mod tree;

pub use config::{NoParams, ProjectConfig, ProjectParams, deep_update};
pub use error::{BuildError, CrawlError, ParamError, TreeError};
pub use node::{
    BehaviorNode, Descendants, HierNode, HierarchyKind, NodeFactory, NodeId, NodeRef,
    NodeVariant, Payload, SliceNode, levels,
};
pub use tree::HierTree;
