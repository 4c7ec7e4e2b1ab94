//! Hierarchy node types and borrowed node views.

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

use crate::tree::HierTree;

/// Level names used by the standard hierarchies.
pub mod levels {
    /// Experimental condition.
    pub const COND: &str = "cond";
    /// Subject (one animal).
    pub const MOUSE: &str = "mouse";
    /// Recording session.
    pub const DAY: &str = "day";
    /// Imaged cell in a slice experiment.
    pub const CELL: &str = "cell";
}

/// Free-form metadata attached to a node by its level rule.
pub type Payload = IndexMap<String, Value>;

/// Unique identifier for a node within a tree.
///
/// Ids are dense indices assigned in creation order, so sorting by id gives
/// depth-first pre-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Create a new NodeId from an index.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Index of the node inside its tree.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Which hierarchy a node belongs to.
///
/// Decides the fixed set of named ancestor accessors exposed through
/// [`NodeRef::variant`].
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HierarchyKind {
    /// No named accessors, only [`NodeRef::ancestor`].
    #[default]
    Generic,
    /// cond / mouse / day behavior experiments.
    Behavior,
    /// cond / cell slice experiments.
    Slice,
}

/// One directory at one level of the hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierNode {
    /// Directory name after normalization.
    pub name: CompactString,

    /// Final on-disk location of the directory.
    pub path: PathBuf,

    /// Level tag, e.g. "cond" or "day".
    pub level: CompactString,

    /// Hierarchy variant chosen by the node factory.
    pub kind: HierarchyKind,

    /// Parent node, `None` for roots.
    pub parent: Option<NodeId>,

    /// Children in discovery order.
    pub children: Vec<NodeId>,

    /// Level-specific metadata.
    pub payload: Payload,
}

impl HierNode {
    /// Create a node without children.
    pub fn new(
        name: impl Into<CompactString>,
        path: impl Into<PathBuf>,
        level: impl Into<CompactString>,
        kind: HierarchyKind,
        parent: Option<NodeId>,
        payload: Payload,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            level: level.into(),
            kind,
            parent,
            children: Vec::new(),
            payload,
        }
    }

    /// Check if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Constructs nodes for the tree builder.
///
/// This is the extension point for hierarchy-specific node variants. Any
/// closure with the matching signature is a factory.
pub trait NodeFactory {
    /// Build the node for a discovered directory.
    fn create(
        &self,
        name: &str,
        path: &Path,
        level: &str,
        parent: Option<NodeId>,
        payload: Payload,
    ) -> HierNode;
}

impl NodeFactory for HierarchyKind {
    fn create(
        &self,
        name: &str,
        path: &Path,
        level: &str,
        parent: Option<NodeId>,
        payload: Payload,
    ) -> HierNode {
        HierNode::new(name, path, level, *self, parent, payload)
    }
}

impl<F> NodeFactory for F
where
    F: Fn(&str, &Path, &str, Option<NodeId>, Payload) -> HierNode,
{
    fn create(
        &self,
        name: &str,
        path: &Path,
        level: &str,
        parent: Option<NodeId>,
        payload: Payload,
    ) -> HierNode {
        self(name, path, level, parent, payload)
    }
}

/// Borrowed handle to a node inside a [`HierTree`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a HierTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(tree: &'a HierTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    /// Id of the node inside its tree.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The tree this node belongs to.
    pub fn tree(&self) -> &'a HierTree {
        self.tree
    }

    /// The underlying node data.
    pub fn node(&self) -> &'a HierNode {
        self.tree.node(self.id)
    }

    /// Directory name after normalization.
    pub fn name(&self) -> &'a str {
        self.node().name.as_str()
    }

    /// Final on-disk location of the directory.
    pub fn path(&self) -> &'a Path {
        &self.node().path
    }

    /// Level tag, e.g. "cond" or "day".
    pub fn level(&self) -> &'a str {
        self.node().level.as_str()
    }

    /// Hierarchy variant chosen at creation.
    pub fn kind(&self) -> HierarchyKind {
        self.node().kind
    }

    /// Level-specific metadata.
    pub fn payload(&self) -> &'a Payload {
        &self.node().payload
    }

    /// Parent node, `None` for roots.
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|id| NodeRef::new(self.tree, id))
    }

    /// Direct children in discovery order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + use<'a> {
        let tree = self.tree;
        self.node()
            .children
            .iter()
            .map(move |&id| NodeRef::new(tree, id))
    }

    /// Check if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.node().is_leaf()
    }

    /// Number of ancestors above this node (roots have depth 0).
    pub fn depth(&self) -> usize {
        std::iter::successors(self.parent(), |n| n.parent()).count()
    }

    /// Nearest node with the given level, starting at this node itself.
    ///
    /// Walks parent links upward; returns `None` when the chain runs out.
    pub fn ancestor(&self, level: &str) -> Option<NodeRef<'a>> {
        std::iter::successors(Some(*self), |n| n.parent()).find(|n| n.level() == level)
    }

    /// This node and everything below it, depth-first pre-order.
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants {
            tree: self.tree,
            stack: vec![self.id],
        }
    }

    /// Typed view matching the node's hierarchy kind.
    pub fn variant(&self) -> NodeVariant<'a> {
        match self.kind() {
            HierarchyKind::Generic => NodeVariant::Generic(*self),
            HierarchyKind::Behavior => NodeVariant::Behavior(BehaviorNode(*self)),
            HierarchyKind::Slice => NodeVariant::Slice(SliceNode(*self)),
        }
    }

    /// Behavior view, if this node was created as part of a behavior tree.
    pub fn as_behavior(&self) -> Option<BehaviorNode<'a>> {
        match self.variant() {
            NodeVariant::Behavior(node) => Some(node),
            _ => None,
        }
    }

    /// Slice view, if this node was created as part of a slice tree.
    pub fn as_slice(&self) -> Option<SliceNode<'a>> {
        match self.variant() {
            NodeVariant::Slice(node) => Some(node),
            _ => None,
        }
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("level", &self.level())
            .field("name", &self.name())
            .finish()
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    tree: &'a HierTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.node(id).children.iter().rev().copied());
        Some(NodeRef::new(self.tree, id))
    }
}

/// A node seen through the accessors of its hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeVariant<'a> {
    Generic(NodeRef<'a>),
    Behavior(BehaviorNode<'a>),
    Slice(SliceNode<'a>),
}

impl<'a> NodeVariant<'a> {
    /// The plain node handle behind the view.
    pub fn node(&self) -> NodeRef<'a> {
        match self {
            NodeVariant::Generic(node) => *node,
            NodeVariant::Behavior(node) => node.0,
            NodeVariant::Slice(node) => node.0,
        }
    }
}

/// Node of a cond / mouse / day hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorNode<'a>(NodeRef<'a>);

impl<'a> BehaviorNode<'a> {
    pub fn cond(&self) -> Option<NodeRef<'a>> {
        self.0.ancestor(levels::COND)
    }

    pub fn mouse(&self) -> Option<NodeRef<'a>> {
        self.0.ancestor(levels::MOUSE)
    }

    pub fn day(&self) -> Option<NodeRef<'a>> {
        self.0.ancestor(levels::DAY)
    }
}

impl<'a> Deref for BehaviorNode<'a> {
    type Target = NodeRef<'a>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Node of a cond / cell hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceNode<'a>(NodeRef<'a>);

impl<'a> SliceNode<'a> {
    pub fn cond(&self) -> Option<NodeRef<'a>> {
        self.0.ancestor(levels::COND)
    }

    pub fn cell(&self) -> Option<NodeRef<'a>> {
        self.0.ancestor(levels::CELL)
    }
}

impl<'a> Deref for SliceNode<'a> {
    type Target = NodeRef<'a>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
