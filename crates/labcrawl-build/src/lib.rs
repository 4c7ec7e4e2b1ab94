//! Rule-driven hierarchy discovery for labcrawl.
//!
//! A hierarchy is described by an ordered list of [`LevelRule`]s, one per
//! depth. [`TreeBuilder`] applies them from a root directory and produces a
//! [`HierTree`]:
//!
//! 1. list the children of the current directory matching the rule's glob,
//!    sorted by name
//! 2. keep directories accepted by the rule's filter
//! 3. normalize each directory (this may rename it on disk)
//! 4. load the level's payload (best effort)
//! 5. create the node and recurse with the next rule
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use labcrawl_build::{Layout, TreeBuilder};
//! use labcrawl_core::NoParams;
//!
//! let layout = Layout::Behavior;
//! let tree = TreeBuilder::for_layout(layout)
//!     .build(Path::new("/data/project"), &NoParams, &layout.kind())?;
//!
//! for node in tree.iter() {
//!     println!("{:indent$}{}", "", node.name(), indent = node.depth() * 2);
//! }
//! # Ok::<(), labcrawl_build::BuildError>(())
//! ```

mod builder;
mod rule;
mod standard;

pub use builder::{BuildStats, TreeBuilder};
pub use rule::{DirFilter, DirPreprocess, LevelRule, PayloadLoader, basic_dir_filter};
pub use standard::{
    DAY_SUFFIX_SEPARATOR, EXP_PARAM_KEY, Layout, cell_rule, cond_rule, day_rule, load_day_payload,
    mouse_rule, normalize_day_dir,
};

// Re-export core types for convenience
pub use labcrawl_core::{
    BuildError, HierNode, HierTree, HierarchyKind, NodeFactory, NodeId, NodeRef, Payload,
    ProjectParams,
};
