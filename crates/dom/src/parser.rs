//! XHTML Parser - builds the node arena from document text
//!
//! This handles:
//! - XML parsing (roxmltree, DTD allowed so `<!DOCTYPE html>` passes)
//! - Qualified names for namespaced tags and attributes (`ix:nonFraction`)
//! - Root namespace declarations for rebuilding page documents
//!
//! Processing instructions are dropped; text and comment nodes are kept so
//! that serialized pages round-trip the original content.

use crate::arena::DomArena;
use crate::document::Document;
use crate::error::{DomError, Result};
use crate::types::*;
use std::collections::HashMap;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Configuration for the XHTML parser
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Keep text nodes consisting only of whitespace
    pub keep_whitespace_text: bool,
    /// Keep comment nodes
    pub keep_comments: bool,
    /// Upper bound on parsed nodes (roxmltree guard)
    pub nodes_limit: u32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            keep_whitespace_text: true,
            keep_comments: true,
            nodes_limit: u32::MAX,
        }
    }
}

/// Main XHTML parser
pub struct XhtmlParser {
    config: ParserConfig,
}

impl XhtmlParser {
    /// Create new parser with default config
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// Create parser with custom config
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse document text into a [`Document`]
    ///
    /// Malformed input is a fatal [`crate::DomError::Parse`].
    pub fn parse(&self, text: &str) -> Result<Document> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            nodes_limit: self.config.nodes_limit,
            ..roxmltree::ParsingOptions::default()
        };
        let xml = roxmltree::Document::parse_with_options(text, options)?;

        let mut arena = DomArena::with_capacity(xml.descendants().count());
        let document_id = self
            .parse_node(&mut arena, xml.root(), None)?
            .ok_or(DomError::MissingElement("root"))?;
        arena.set_root(document_id)?;

        let root = xml.root_element();
        let namespaces = root
            .namespaces()
            .filter(|ns| ns.name() != Some("xml"))
            .map(|ns| NamespaceDecl {
                prefix: ns.name().map(str::to_string),
                uri: ns.uri().to_string(),
            })
            .collect();

        tracing::debug!(nodes = arena.len(), "parsed XHTML document");
        Document::from_arena(arena, namespaces)
    }

    /// Recursively convert a roxmltree node; returns `None` for skipped nodes
    fn parse_node(
        &self,
        arena: &mut DomArena,
        xml_node: roxmltree::Node,
        parent_id: Option<NodeId>,
    ) -> Result<Option<NodeId>> {
        let node = if xml_node.is_root() {
            DomNode::new(0, NodeType::Document, "#document".to_string())
        } else if xml_node.is_element() {
            let mut attributes = HashMap::new();
            for attr in xml_node.attributes() {
                let name = qualified_name(&xml_node, attr.namespace(), attr.name());
                attributes.insert(name, attr.value().to_string());
            }
            let tag = qualified_name(
                &xml_node,
                xml_node.tag_name().namespace(),
                xml_node.tag_name().name(),
            );
            DomNode::element(0, &tag, attributes)
        } else if xml_node.is_text() {
            let text = xml_node.text().unwrap_or("");
            if !self.config.keep_whitespace_text && text.trim().is_empty() {
                return Ok(None);
            }
            DomNode::text(0, text)
        } else if xml_node.is_comment() && self.config.keep_comments {
            let mut comment = DomNode::new(0, NodeType::Comment, "#comment".to_string());
            comment.node_value = xml_node.text().unwrap_or("").to_string();
            comment
        } else {
            return Ok(None);
        };

        // Add node to arena
        let current_node_id = arena.add_node(node);
        if let Some(parent_id) = parent_id {
            arena.append_child(parent_id, current_node_id)?;
        }

        // Parse children
        for child in xml_node.children() {
            self.parse_node(arena, child, Some(current_node_id))?;
        }

        Ok(Some(current_node_id))
    }
}

impl Default for XhtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse with the default configuration
pub fn parse_document(text: &str) -> Result<Document> {
    XhtmlParser::new().parse(text)
}

/// `prefix:local` when the namespace is bound to a prefix, else `local`
fn qualified_name(scope: &roxmltree::Node, namespace: Option<&str>, local: &str) -> String {
    let prefix = match namespace {
        Some(XML_NAMESPACE) => Some("xml"),
        Some(uri) => scope.lookup_prefix(uri),
        None => None,
    };
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:ix="http://www.xbrl.org/2013/inlineXBRL" xml:lang="en">
<head><title>Report</title></head>
<body><div id="pf1" class="pf w0"><ix:nonFraction name="x">12</ix:nonFraction></div><!-- end --></body>
</html>"#;

    #[test]
    fn test_parse_simple_document() {
        let document = parse_document(SAMPLE).unwrap();
        let arena = document.arena();

        let root = arena.get(document.root_element()).unwrap();
        assert_eq!(root.node_name, "html");
        assert_eq!(root.attr("xml:lang"), Some("en"));

        assert!(document.head().is_some());
        let body = document.body().unwrap();
        assert_eq!(arena.get(body).unwrap().node_name, "body");

        let pf = arena.find_by_id("pf1");
        assert_eq!(pf.len(), 1);
        let pf = arena.get(pf[0]).unwrap();
        assert!(pf.has_class("pf"));
        assert_eq!(pf.parent_id, Some(body));

        let fact = arena.get(pf.children_ids[0]).unwrap();
        assert_eq!(fact.node_name, "ix:nonFraction");
        assert_eq!(fact.local_name(), "nonFraction");
    }

    #[test]
    fn test_namespaces_collected() {
        let document = parse_document(SAMPLE).unwrap();
        let prefixes: Vec<Option<&str>> = document
            .namespaces()
            .iter()
            .map(|ns| ns.prefix.as_deref())
            .collect();
        assert!(prefixes.contains(&None));
        assert!(prefixes.contains(&Some("ix")));

        let decls = document.root_declarations().unwrap();
        assert!(decls.contains("xmlns=\"http://www.w3.org/1999/xhtml\""));
        assert!(decls.contains("xml:lang=\"en\""));
    }

    #[test]
    fn test_comments_and_whitespace_config() {
        let parser = XhtmlParser::with_config(ParserConfig {
            keep_whitespace_text: false,
            keep_comments: false,
            ..ParserConfig::default()
        });
        let document = parser.parse(SAMPLE).unwrap();
        assert!(document
            .arena()
            .iter()
            .all(|n| n.node_type != NodeType::Comment));
        assert!(document
            .arena()
            .iter()
            .filter(|n| n.is_text())
            .all(|n| !n.node_value.trim().is_empty()));
    }

    #[test]
    fn test_malformed_input_is_parse_error() {
        let err = parse_document("<html><body><div></body></html>").unwrap_err();
        assert!(matches!(err, crate::DomError::Parse(_)));
    }
}
