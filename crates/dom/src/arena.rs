//! Arena-based DOM tree storage
//!
//! "Bad programmers worry about the code. Good programmers worry about
//! data structures and their relationships."
//!
//! Node identity is the arena index. Two elements with identical tag and
//! attributes are two entries, never one. Re-parenting a node changes its
//! `parent_id` and its old/new parents' `children_ids`; the node itself
//! never moves inside the Vec, so every `NodeId` stays valid.
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};

/// Arena allocator for DOM nodes
#[derive(Debug, Clone)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(1024), // Pre-allocate for typical filing
            root_id: None,
        }
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root_id: None,
        }
    }

    /// Add a node to the arena, returns its ID
    ///
    /// The node's `node_id` is overwritten with its arena index.
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        self.nodes.push(node);
        node_id
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        // Verify node exists
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterator over all nodes
    pub fn iter(&self) -> impl Iterator<Item = &DomNode> {
        self.nodes.iter()
    }

    /// Append `child` as last child of `parent`
    ///
    /// The child must be detached (no parent). Use [`DomArena::move_node`]
    /// to re-parent an attached node.
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        self.get(child_id)?;
        self.get_mut(parent_id)?.children_ids.push(child_id);
        self.get_mut(child_id)?.parent_id = Some(parent_id);
        Ok(())
    }

    /// Remove a node from its parent's children; the subtree stays intact
    pub fn detach(&mut self, node_id: NodeId) -> Result<()> {
        let parent_id = self.get(node_id)?.parent_id;
        if let Some(parent_id) = parent_id {
            let parent = self.get_mut(parent_id)?;
            parent.children_ids.retain(|id| *id != node_id);
        }
        self.get_mut(node_id)?.parent_id = None;
        Ok(())
    }

    /// Transfer a node (with its whole subtree) to the end of `new_parent`
    pub fn move_node(&mut self, node_id: NodeId, new_parent: NodeId) -> Result<()> {
        self.detach(node_id)?;
        self.append_child(new_parent, node_id)
    }

    /// Traverse tree depth-first (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Pre-order IDs of a subtree, `start_id` included
    pub fn subtree_ids(&self, start_id: NodeId) -> Result<Vec<NodeId>> {
        let mut ids = Vec::new();
        self.traverse_df(start_id, |node| {
            ids.push(node.node_id);
            Ok(())
        })?;
        Ok(ids)
    }

    /// Find nodes matching predicate
    pub fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, node)| {
                if predicate(node) {
                    Some(idx as NodeId)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Find all elements by local tag name (namespace prefix ignored)
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.find(|node| {
            node.node_type == NodeType::Element && node.local_name().eq_ignore_ascii_case(tag)
        })
    }

    /// Find elements by ID attribute (ids are not assumed unique)
    pub fn find_by_id(&self, id: &str) -> Vec<NodeId> {
        self.find(|node| node.node_type == NodeType::Element && node.attr("id") == Some(id))
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}
