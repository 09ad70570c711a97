//! Core type definitions for the XHTML node arena
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Identity is the index, never structural equality
//! 3. Use SmallVec for small arrays (avoid heap allocation)

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Node identifier (index into arena)
/// u32 allows 4 billion nodes, enough for any filing
pub type NodeId = u32;

/// Node type, a subset of the DOM specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    Comment = 8,
    Document = 9,
}

/// Namespace declaration found on the document root (`xmlns` / `xmlns:prefix`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceDecl {
    pub prefix: Option<String>,
    pub uri: String,
}

impl NamespaceDecl {
    /// Render as an attribute, e.g. `xmlns:ix="http://..."`
    pub fn to_attribute(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("xmlns:{}=\"{}\"", prefix, crate::utils::escape_attr(&self.uri)),
            None => format!("xmlns=\"{}\"", crate::utils::escape_attr(&self.uri)),
        }
    }
}

/// The main DOM tree node structure
///
/// Design philosophy:
/// - Small fixed-size fields first (better packing)
/// - Use indices instead of pointers
/// - Class list and raw style are resolved once at parse time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomNode {
    pub node_id: NodeId,
    pub node_type: NodeType,

    // Navigation indices
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>, // Most nodes have <4 children

    /// Qualified tag name (`div`, `ix:nonFraction`), `#text`, `#comment` or `#document`
    pub node_name: String,
    /// Text content for text and comment nodes
    pub node_value: String,
    /// Qualified attribute name -> value (order-irrelevant)
    pub attributes: HashMap<String, String>,

    /// Whitespace-separated tokens of the `class` attribute
    pub class_list: SmallVec<[String; 2]>,
    /// Raw `style` attribute, empty when absent
    pub style: String,
}

impl DomNode {
    /// Create a new node with required fields
    pub fn new(node_id: NodeId, node_type: NodeType, node_name: String) -> Self {
        Self {
            node_id,
            node_type,
            parent_id: None,
            children_ids: SmallVec::new(),
            node_name,
            node_value: String::new(),
            attributes: HashMap::new(),
            class_list: SmallVec::new(),
            style: String::new(),
        }
    }

    /// Create an element with the given attributes; class list and style are derived
    pub fn element(node_id: NodeId, tag: &str, attributes: HashMap<String, String>) -> Self {
        let mut node = Self::new(node_id, NodeType::Element, tag.to_string());
        node.class_list = attributes
            .get("class")
            .map(|c| crate::utils::class_tokens(c))
            .unwrap_or_default();
        node.style = attributes.get("style").cloned().unwrap_or_default();
        node.attributes = attributes;
        node
    }

    /// Create a text node
    pub fn text(node_id: NodeId, value: &str) -> Self {
        let mut node = Self::new(node_id, NodeType::Text, "#text".to_string());
        node.node_value = value.to_string();
        node
    }

    /// Tag name without namespace prefix (`ix:nonFraction` -> `nonFraction`)
    pub fn local_name(&self) -> &str {
        match self.node_name.split_once(':') {
            Some((_, local)) => local,
            None => &self.node_name,
        }
    }

    /// Check if node is an element
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if node is text
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Check for an exact class token
    pub fn has_class(&self, class: &str) -> bool {
        self.class_list.iter().any(|c| c == class)
    }

    /// Render as `tag` or `tag.class1.class2` (container hierarchy item)
    pub fn selector_label(&self) -> String {
        let mut label = self.node_name.clone();
        for class in &self.class_list {
            label.push('.');
            label.push_str(class);
        }
        label
    }
}

/// Elements whose local name marks stylesheet content
pub const STYLE_TAGS: &[&str] = &["style"];

/// Attributes on the root element that carry over to sliced page documents
pub const ROOT_CARRY_PREFIXES: &[&str] = &["xml:"];
