//! Utility functions for DOM processing

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{NodeId, NodeType};
use smallvec::SmallVec;

/// Cap text length, appending `...` when cut (char-boundary safe)
pub fn cap_text_length(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        text.to_string()
    } else {
        let mut end = max_len;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

/// Split a `class` attribute into tokens
pub fn class_tokens(class: &str) -> SmallVec<[String; 2]> {
    class.split_whitespace().map(str::to_string).collect()
}

/// Parse a CSS declaration list (`width:210mm; height:297mm`) into ordered pairs
///
/// Property names are trimmed and lowercased, values trimmed. Entries
/// without a `:` are skipped; a later duplicate key follows the earlier one,
/// so callers folding into a map get last-wins semantics.
pub fn parse_style_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|rule| {
            let (prop, value) = rule.split_once(':')?;
            let prop = prop.trim();
            if prop.is_empty() {
                return None;
            }
            Some((prop.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

/// Get all text content from node and its children
pub fn get_text_content(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let mut text = String::new();

    arena.traverse_df(node_id, |node| {
        if node.node_type == NodeType::Text {
            text.push_str(&node.node_value);
        }
        Ok(())
    })?;

    Ok(text.trim().to_string())
}

/// Escape character data
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value for double-quoted output
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
