//! Arena container for a discovered hierarchy.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::node::{HierNode, NodeId, NodeRef};

/// A forest of hierarchy nodes produced by one build.
///
/// Nodes live in an arena and refer to each other by [`NodeId`]. A node is
/// listed in its parent's `children` exactly when its `parent` points at that
/// parent; [`HierTree::insert`] is the only way to add nodes and keeps both
/// sides in sync. Deserialization replays every node through `insert` and
/// rejects links that do not form a forest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawTree")]
pub struct HierTree {
    nodes: Vec<HierNode>,
    roots: Vec<NodeId>,
}

impl HierTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and link it under its parent, or as a new root.
    ///
    /// Children are appended, so insertion order is sibling order. Any
    /// `children` already set on `node` are discarded.
    ///
    /// # Panics
    ///
    /// Panics if `node.parent` does not belong to this tree.
    pub fn insert(&mut self, mut node: HierNode) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        node.children.clear();
        match node.parent {
            Some(parent) => self.nodes[parent.index()].children.push(id),
            None => self.roots.push(id),
        }
        self.nodes.push(node);
        id
    }

    pub(crate) fn node(&self, id: NodeId) -> &HierNode {
        &self.nodes[id.index()]
    }

    /// Get a handle to a node, if the id is valid.
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.index() < self.nodes.len()).then(|| NodeRef::new(self, id))
    }

    /// Top-level nodes in discovery order.
    pub fn roots(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.roots.iter().map(move |&id| NodeRef::new(self, id))
    }

    pub fn root_ids(&self) -> &[NodeId] {
        &self.roots
    }

    /// Every node in the forest, depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.roots().flat_map(|root| root.descendants())
    }

    /// Find the node whose directory is `path`.
    pub fn find_by_path(&self, path: &Path) -> Option<NodeRef<'_>> {
        self.nodes
            .iter()
            .position(|n| n.path == path)
            .map(|i| NodeRef::new(self, NodeId::new(i)))
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Serialized form of a [`HierTree`], before its links are checked.
#[derive(Deserialize)]
struct RawTree {
    nodes: Vec<HierNode>,
    roots: Vec<NodeId>,
}

impl TryFrom<RawTree> for HierTree {
    type Error = TreeError;

    fn try_from(raw: RawTree) -> Result<Self, Self::Error> {
        let mut slots: Vec<Option<HierNode>> = raw.nodes.into_iter().map(Some).collect();
        let mut tree = HierTree::new();

        // (stored id, new parent id, stored parent id)
        let mut pending: Vec<(NodeId, Option<NodeId>, Option<NodeId>)> =
            raw.roots.iter().rev().map(|&id| (id, None, None)).collect();

        while let Some((id, new_parent, listed_under)) = pending.pop() {
            let slot = slots
                .get_mut(id.index())
                .ok_or(TreeError::DanglingId { id: id.index() })?;
            let mut node = slot.take().ok_or(TreeError::Revisited { id: id.index() })?;
            if node.parent != listed_under {
                return Err(TreeError::ParentMismatch {
                    id: id.index(),
                    listed_under: listed_under.map(NodeId::index),
                    parent: node.parent.map(NodeId::index),
                });
            }

            let children = std::mem::take(&mut node.children);
            node.parent = new_parent;
            let new_id = tree.insert(node);
            pending.extend(children.into_iter().rev().map(|child| (child, Some(new_id), Some(id))));
        }

        let count = slots.iter().filter(|slot| slot.is_some()).count();
        if count > 0 {
            return Err(TreeError::Unreachable { count });
        }
        Ok(tree)
    }
}
