use std::path::Path;

use labcrawl_core::{
    HierNode, HierTree, HierarchyKind, NodeFactory, NodeId, NodeVariant, Payload, levels,
};
use serde_json::json;

fn slice_tree() -> HierTree {
    let mut tree = HierTree::new();
    for cond in ["condA", "condB"] {
        let cond_id = tree.insert(HierarchyKind::Slice.create(
            cond,
            &Path::new("/prj").join(cond),
            levels::COND,
            None,
            Payload::new(),
        ));
        for cell in ["s1_XY01", "s1_XY02"] {
            let mut payload = Payload::new();
            payload.insert("cell".to_string(), json!(cell));
            tree.insert(HierarchyKind::Slice.create(
                cell,
                &Path::new("/prj").join(cond).join(cell),
                levels::CELL,
                Some(cond_id),
                payload,
            ));
        }
    }
    tree
}

#[test]
fn test_parent_child_consistency() {
    let tree = slice_tree();
    assert_eq!(tree.len(), 6);

    for node in tree.iter() {
        match node.parent() {
            Some(parent) => assert!(parent.children().any(|c| c == node)),
            None => assert!(tree.roots().any(|r| r == node)),
        }
        for child in node.children() {
            assert_eq!(child.parent(), Some(node));
        }
    }
}

#[test]
fn test_slice_accessors() {
    let tree = slice_tree();
    let cell = tree.get(NodeId::new(2)).unwrap();

    match cell.variant() {
        NodeVariant::Slice(slice) => {
            assert_eq!(slice.cell(), Some(cell));
            assert_eq!(slice.cond().unwrap().name(), "condA");
        }
        other => panic!("unexpected variant {other:?}"),
    }
    assert!(cell.as_behavior().is_none());
    assert_eq!(cell.payload()["cell"], json!("s1_XY02"));
}

#[test]
fn test_ancestor_never_fails() {
    let tree = slice_tree();
    for node in tree.iter() {
        for level in [levels::COND, levels::CELL, levels::DAY, ""] {
            if let Some(found) = node.ancestor(level) {
                assert_eq!(found.level(), level);
                assert!(std::iter::successors(Some(node), |n| n.parent()).any(|n| n == found));
            }
        }
        assert_eq!(node.ancestor(node.level()), Some(node));
    }
}

#[test]
fn test_generic_nodes_have_no_typed_view() {
    let mut tree = HierTree::new();
    let id = tree.insert(HierNode::new(
        "root",
        "/root",
        "top",
        HierarchyKind::Generic,
        None,
        Payload::new(),
    ));
    let node = tree.get(id).unwrap();
    assert!(matches!(node.variant(), NodeVariant::Generic(_)));
    assert!(node.as_behavior().is_none());
    assert!(node.as_slice().is_none());
}

#[test]
fn test_tree_serializes() {
    let tree = slice_tree();
    let value = serde_json::to_value(&tree).unwrap();
    assert_eq!(value["roots"], json!([0, 3]));
    assert_eq!(value["nodes"][1]["kind"], json!("slice"));
    assert_eq!(value["nodes"][1]["parent"], json!(0));
}
