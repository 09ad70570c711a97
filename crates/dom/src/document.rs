//! Parsed XHTML document: the node arena plus what page slicing needs to
//! rebuild standalone documents (head, body, root namespace declarations).

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{DomNode, NamespaceDecl, NodeId, NodeType, ROOT_CARRY_PREFIXES, STYLE_TAGS};
use crate::utils;

/// Owns every node of one parsed document
#[derive(Debug, Clone)]
pub struct Document {
    arena: DomArena,
    /// The `#document` node
    document_id: NodeId,
    /// Root element (`<html>` for XHTML)
    root_element: NodeId,
    head_id: Option<NodeId>,
    body_id: Option<NodeId>,
    namespaces: Vec<NamespaceDecl>,
}

impl Document {
    /// Assemble a document from an arena whose root is the `#document` node
    pub fn from_arena(arena: DomArena, namespaces: Vec<NamespaceDecl>) -> Result<Self> {
        let document_id = arena.root_id().ok_or(DomError::MissingElement("root"))?;
        let root_element = arena
            .get(document_id)?
            .children_ids
            .iter()
            .copied()
            .find(|&id| arena.get(id).map(|n| n.is_element()).unwrap_or(false))
            .ok_or(DomError::MissingElement("root"))?;

        let first_child = |local: &str| -> Option<NodeId> {
            arena.get(root_element).ok()?.children_ids.iter().copied().find(|&id| {
                arena
                    .get(id)
                    .map(|n| n.is_element() && n.local_name().eq_ignore_ascii_case(local))
                    .unwrap_or(false)
            })
        };
        let head_id = first_child("head");
        // Fall back to a nested <body> for documents wrapped in something other than <html>
        let body_id = first_child("body").or_else(|| arena.find_by_tag("body").first().copied());

        Ok(Self {
            arena,
            document_id,
            root_element,
            head_id,
            body_id,
            namespaces,
        })
    }

    /// Get reference to internal arena
    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    /// Get mutable reference to internal arena
    pub fn arena_mut(&mut self) -> &mut DomArena {
        &mut self.arena
    }

    /// Shorthand for `arena().get()`
    pub fn node(&self, node_id: NodeId) -> Result<&DomNode> {
        self.arena.get(node_id)
    }

    pub fn document_id(&self) -> NodeId {
        self.document_id
    }

    pub fn root_element(&self) -> NodeId {
        self.root_element
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head_id
    }

    pub fn body(&self) -> Option<NodeId> {
        self.body_id
    }

    /// Body if present, else the root element
    pub fn content_root(&self) -> NodeId {
        self.body_id.unwrap_or(self.root_element)
    }

    /// Namespace declarations of the root element, in document order
    pub fn namespaces(&self) -> &[NamespaceDecl] {
        &self.namespaces
    }

    /// Root-level attributes that page documents inherit: `xmlns*` plus `xml:*`
    pub fn root_declarations(&self) -> Result<String> {
        let mut parts: Vec<String> = self.namespaces.iter().map(|ns| ns.to_attribute()).collect();

        let root = self.arena.get(self.root_element)?;
        let mut carried: Vec<(&String, &String)> = root
            .attributes
            .iter()
            .filter(|(name, _)| ROOT_CARRY_PREFIXES.iter().any(|p| name.starts_with(p)))
            .collect();
        carried.sort();
        for (name, value) in carried {
            parts.push(format!("{}=\"{}\"", name, utils::escape_attr(value)));
        }

        Ok(parts.join(" "))
    }

    /// Text of every `<style>` element, in document order
    pub fn style_texts(&self) -> Result<Vec<String>> {
        let mut texts = Vec::new();
        self.arena.traverse_df(self.document_id, |node| {
            if node.node_type == NodeType::Element
                && STYLE_TAGS.iter().any(|t| node.local_name().eq_ignore_ascii_case(t))
            {
                texts.push(utils::get_text_content(&self.arena, node.node_id)?);
            }
            Ok(())
        })?;
        Ok(texts)
    }

    /// Element IDs in document (pre-order) order
    pub fn elements(&self) -> Result<Vec<NodeId>> {
        let mut ids = Vec::new();
        self.arena.traverse_df(self.document_id, |node| {
            if node.is_element() {
                ids.push(node.node_id);
            }
            Ok(())
        })?;
        Ok(ids)
    }
}
