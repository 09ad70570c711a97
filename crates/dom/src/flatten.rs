//! DOM Flattener - the coordinate space for page slicing
//!
//! Produces a depth-first pre-order list of every node below a root (text
//! and comment nodes included) together with a parent map built in the same
//! pass. Pure function of the tree: flattening an unmodified tree twice
//! yields identical results.

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{NodeId, NodeType};
use ahash::AHashMap;

/// Result of one flattening pass
#[derive(Debug, Clone)]
pub struct Flattened {
    root: NodeId,
    order: Vec<NodeId>,
    position: AHashMap<NodeId, usize>,
    /// Parent of every flattened node, plus the chain from `root` up to the document node
    parent_of: AHashMap<NodeId, NodeId>,
}

impl Flattened {
    /// The node the traversal started from
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Nodes in pre-order
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Flattened index of a node, `None` if outside the flattened subtree
    pub fn position_of(&self, node_id: NodeId) -> Option<usize> {
        self.position.get(&node_id).copied()
    }

    /// Node at a flattened index
    pub fn node_at(&self, index: usize) -> Option<NodeId> {
        self.order.get(index).copied()
    }

    /// Parent as recorded at flattening time
    pub fn parent_of(&self, node_id: NodeId) -> Option<NodeId> {
        self.parent_of.get(&node_id).copied()
    }

    /// `node_id` followed by its ancestors up to the document node
    ///
    /// O(depth): walks the parent map, never the tree.
    pub fn ancestry(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![node_id];
        let mut current = node_id;
        while let Some(parent) = self.parent_of(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }
}

impl PartialEq for Flattened {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
            && self.order == other.order
            && self.parent_of.len() == other.parent_of.len()
            && self
                .parent_of
                .iter()
                .all(|(node, parent)| other.parent_of.get(node) == Some(parent))
    }
}

impl Eq for Flattened {}

/// Linearize the subtree under `root`
///
/// The root itself is left out of the sequence when it is `<body>`,
/// `<html>` or the document node, so a page never starts at the body.
pub fn flatten(arena: &DomArena, root: NodeId) -> Result<Flattened> {
    let root_node = arena.get(root)?;
    let include_root = root_node.node_type == NodeType::Element
        && !matches!(root_node.local_name(), "body" | "html");

    let mut order = Vec::new();
    let mut parent_of = AHashMap::new();

    // Chain above the root, so hierarchy paths reach the document node
    let mut current = root;
    while let Some(parent) = arena.get(current)?.parent_id {
        parent_of.insert(current, parent);
        current = parent;
    }

    if include_root {
        order.push(root);
    }

    // Iterative pre-order, children pushed in reverse to visit left-to-right
    let mut stack: Vec<NodeId> = root_node.children_ids.iter().rev().copied().collect();
    for &child in &root_node.children_ids {
        parent_of.insert(child, root);
    }

    while let Some(node_id) = stack.pop() {
        order.push(node_id);
        let node = arena.get(node_id)?;
        for &child_id in node.children_ids.iter().rev() {
            parent_of.insert(child_id, node_id);
            stack.push(child_id);
        }
    }

    let position = order
        .iter()
        .enumerate()
        .map(|(idx, &id)| (id, idx))
        .collect();

    Ok(Flattened {
        root,
        order,
        position,
        parent_of,
    })
}
