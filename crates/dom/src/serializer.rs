//! DOM Serializer - convert arena subtrees back to XHTML text
//!
//! This module handles:
//! - Element/text/comment serialization with proper escaping
//! - Deterministic attribute order (sorted by name)
//! - Standalone page documents: head + root declarations + page body

use crate::arena::DomArena;
use crate::document::Document;
use crate::error::Result;
use crate::types::*;
use crate::utils;

/// Elements written as `<tag/>` when they have no children
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Serializer configuration
#[derive(Debug, Clone, Default)]
pub struct SerializerConfig {
    /// Write every childless element as `<tag/>`, not only void elements
    pub self_close_empty: bool,
}

/// DOM Tree Serializer
pub struct DomSerializer {
    config: SerializerConfig,
}

impl DomSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Serialize a node and its subtree
    pub fn serialize(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut output = String::with_capacity(4096);
        self.serialize_node(arena, node_id, &mut output)?;
        Ok(output)
    }

    /// Serialize a single node recursively
    fn serialize_node(&self, arena: &DomArena, node_id: NodeId, output: &mut String) -> Result<()> {
        let node = arena.get(node_id)?;

        match node.node_type {
            NodeType::Element => {
                output.push('<');
                output.push_str(&node.node_name);

                let mut attrs: Vec<(&String, &String)> = node.attributes.iter().collect();
                attrs.sort();
                for (name, value) in attrs {
                    output.push(' ');
                    output.push_str(name);
                    output.push_str("=\"");
                    output.push_str(&utils::escape_attr(value));
                    output.push('"');
                }

                if node.children_ids.is_empty()
                    && (self.config.self_close_empty
                        || VOID_ELEMENTS.contains(&node.local_name()))
                {
                    output.push_str("/>");
                    return Ok(());
                }
                output.push('>');

                for &child_id in &node.children_ids {
                    self.serialize_node(arena, child_id, output)?;
                }

                output.push_str("</");
                output.push_str(&node.node_name);
                output.push('>');
            }
            NodeType::Text => {
                output.push_str(&utils::escape_text(&node.node_value));
            }
            NodeType::Comment => {
                output.push_str("<!--");
                output.push_str(&node.node_value);
                output.push_str("-->");
            }
            NodeType::Document => {
                // For document nodes, just serialize children
                for &child_id in &node.children_ids {
                    self.serialize_node(arena, child_id, output)?;
                }
            }
        }

        Ok(())
    }

    /// Short preview of an element, for diagnostics
    pub fn snippet(&self, arena: &DomArena, node_id: NodeId, max_len: usize) -> Result<String> {
        let full = self.serialize(arena, node_id)?;
        Ok(utils::cap_text_length(&full, max_len))
    }

    /// Build a standalone XHTML document around one page root
    ///
    /// The original `<head>` and the root's namespace declarations are
    /// carried over; the page root is wrapped in a fresh `<body>`.
    pub fn page_document(&self, document: &Document, page_root: NodeId) -> Result<String> {
        let declarations = document.root_declarations()?;
        let head = match document.head() {
            Some(head_id) => self.serialize(document.arena(), head_id)?,
            None => String::new(),
        };
        let page = self.serialize(document.arena(), page_root)?;

        let open_html = if declarations.is_empty() {
            "<html>".to_string()
        } else {
            format!("<html {}>", declarations)
        };

        Ok(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n{}\n{}\n<body>\n{}\n</body>\n</html>",
            open_html, head, page
        ))
    }
}

impl Default for DomSerializer {
    fn default() -> Self {
        Self::new()
    }
}
