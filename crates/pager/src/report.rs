//! Report Generator - the page manifest
//!
//! Pure aggregation over the sliced document: per-page tag counts,
//! container hierarchy, dimensions, printed labels, plus document-level
//! numbering and style diagnostics. Nothing here mutates the tree.

use dom::{utils, Document, DomArena, Flattened, NodeId, NodeType};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::dimension::{DimensionResolver, Orientation, PageSize};
use crate::error::Result;
use crate::numbering::{
    diagnose, printed_label, NumberSource, NumberingDiagnostics, NumberingScheme, PageNumbers,
    PrintedLabel,
};
use crate::scanner::{PatternHit, ScanResult};
use crate::slicer::{FallbackReason, PageNumbering, PageSlice, SliceOutcome};

/// Where a document keeps its styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleType {
    Mixed,
    Inline,
    Css,
}

/// Whole-document facts gathered before slicing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentProfile {
    pub style_type: Option<StyleType>,
    pub has_xbrl: bool,
}

impl DocumentProfile {
    /// `inline_threshold`: styled elements needed before inline styling counts
    pub fn analyze(document: &Document, inline_threshold: usize) -> Result<Self> {
        let arena = document.arena();
        let mut inline_styled = 0usize;
        let mut has_stylesheet = false;
        let mut has_xbrl = document
            .namespaces()
            .iter()
            .any(|ns| ns.uri.to_ascii_lowercase().contains("xbrl"));

        for node_id in document.elements()? {
            let node = arena.get(node_id)?;
            if !node.style.trim().is_empty() {
                inline_styled += 1;
            }
            match node.local_name().to_ascii_lowercase().as_str() {
                "style" => has_stylesheet = true,
                "link" => {
                    has_stylesheet |= node
                        .attr("rel")
                        .is_some_and(|rel| rel.to_ascii_lowercase().contains("stylesheet"))
                }
                _ => {}
            }
            has_xbrl |= node.node_name.to_ascii_lowercase().contains("xbrl");
        }

        let inline = inline_styled > inline_threshold;
        let style_type = match (inline, has_stylesheet) {
            (true, true) => Some(StyleType::Mixed),
            (true, false) => Some(StyleType::Inline),
            (false, true) => Some(StyleType::Css),
            (false, false) => None,
        };

        Ok(Self {
            style_type,
            has_xbrl,
        })
    }
}

/// Marker family of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Pf,
    Pc,
    Custom,
}

/// Non-fatal findings attached to the manifest
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    Fallback { reason: FallbackReason },
    NumberingGaps { gaps: Vec<u32>, missing: u64 },
    SchemeMismatch,
    DuplicateNumbers { numbers: Vec<u32> },
    AbsorbedMarker { node: NodeId, page: usize },
    SplitContainer { node: NodeId, page: usize },
    MarkerOutsideBody { node: NodeId },
    UnparseableDimension { node: NodeId, page: usize, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageDimensions {
    /// Original value and unit, e.g. `210mm`
    pub width: String,
    pub height: String,
    pub width_px: f64,
    pub height_px: f64,
    pub orientation: Orientation,
}

impl From<PageSize> for PageDimensions {
    fn from(size: PageSize) -> Self {
        Self {
            width: size.width.to_string(),
            height: size.height.to_string(),
            width_px: size.width_px(),
            height_px: size.height_px(),
            orientation: size.orientation(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRecord {
    pub number: u32,
    pub sequence: usize,
    pub numbering: PageNumbering,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_source: Option<NumberSource>,
    pub kind: PageKind,
    /// Pattern that flagged the marker
    pub pattern: Option<String>,
    pub dimensions: Option<PageDimensions>,
    pub tag_counts: BTreeMap<String, usize>,
    pub container_hierarchy: Vec<String>,
    pub style_rules: BTreeMap<String, String>,
    pub printed_label: Option<PrintedLabel>,
    /// The opening marker was carried into an earlier page
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub marker_absorbed: bool,
    #[serde(skip)]
    pub page_root: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentInfo {
    pub total_pages: usize,
    pub numbering: NumberingDiagnostics,
    pub style_type: Option<StyleType>,
    pub has_xbrl: bool,
    pub semantic_detection: bool,
    pub patterns: Vec<PatternHit>,
    pub fallback: Option<FallbackReason>,
    pub preamble_nodes: usize,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageManifest {
    pub document_info: DocumentInfo,
    pub pages: Vec<PageRecord>,
}

impl PageManifest {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether two pages share a number (drives file naming)
    pub fn has_duplicate_numbers(&self) -> bool {
        self.document_info.numbering.has_duplicates()
    }
}

pub struct ReportGenerator<'a> {
    dimensions: &'a DimensionResolver,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(dimensions: &'a DimensionResolver) -> Self {
        Self { dimensions }
    }

    /// Assemble the manifest; `flattened` is the pre-slice snapshot
    pub fn build(
        &self,
        document: &Document,
        flattened: &Flattened,
        scan: &ScanResult,
        outcome: &SliceOutcome,
        profile: &DocumentProfile,
    ) -> Result<PageManifest> {
        let mut diagnostics = Vec::new();
        if let Some(reason) = outcome.fallback {
            diagnostics.push(Diagnostic::Fallback { reason });
        }

        let mut pages = Vec::with_capacity(outcome.pages.len());
        for slice in &outcome.pages {
            pages.push(self.page_record(document, flattened, slice, &mut diagnostics)?);
        }

        let numbers: Vec<PageNumbers> = pages
            .iter()
            .map(|page| PageNumbers {
                assigned: page.number,
                resolved: page.numbering.is_resolved().then(|| page.numbering.number()),
                printed: page.printed_label.as_ref().map(|label| label.number),
            })
            .collect();
        let numbering = diagnose(&numbers);

        if numbering.has_gaps() {
            tracing::warn!(
                missing = numbering.missing,
                truncated = numbering.gaps_truncated,
                "page numbering has gaps"
            );
            diagnostics.push(Diagnostic::NumberingGaps {
                gaps: numbering.gaps.clone(),
                missing: numbering.missing,
            });
        }
        if numbering.has_duplicates() {
            tracing::warn!(numbers = ?numbering.duplicates, "duplicate page numbers");
            diagnostics.push(Diagnostic::DuplicateNumbers {
                numbers: numbering.duplicates.clone(),
            });
        }
        if numbering.scheme == NumberingScheme::Mixed {
            diagnostics.push(Diagnostic::SchemeMismatch);
        }
        diagnostics.extend(outcome.absorbed.iter().map(|a| Diagnostic::AbsorbedMarker {
            node: a.node,
            page: a.page,
        }));
        diagnostics.extend(outcome.split.iter().map(|s| Diagnostic::SplitContainer {
            node: s.node,
            page: s.page,
        }));
        diagnostics.extend(
            outcome
                .outside
                .iter()
                .map(|&node| Diagnostic::MarkerOutsideBody { node }),
        );

        tracing::info!(
            pages = pages.len(),
            diagnostics = diagnostics.len(),
            "page manifest built"
        );

        Ok(PageManifest {
            document_info: DocumentInfo {
                total_pages: pages.len(),
                numbering,
                style_type: profile.style_type,
                has_xbrl: profile.has_xbrl,
                semantic_detection: scan.semantic,
                patterns: scan.hits.clone(),
                fallback: outcome.fallback,
                preamble_nodes: outcome.preamble_nodes,
                diagnostics,
            },
            pages,
        })
    }

    fn page_record(
        &self,
        document: &Document,
        flattened: &Flattened,
        slice: &PageSlice,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<PageRecord> {
        let arena = document.arena();

        let (kind, dimensions, style_rules, hierarchy) = match &slice.marker {
            // The marker now sits in an earlier page; describe the page by its first node
            Some(_) if slice.marker_absorbed => {
                let anchor = slice.moved.first().copied().unwrap_or(slice.page_root);
                let hierarchy = container_hierarchy(arena, flattened, anchor)?;
                (PageKind::Custom, None, BTreeMap::new(), hierarchy)
            }
            Some(marker) => {
                let node = arena.get(marker.node_id)?;
                let kind = if node.has_class("pf") {
                    PageKind::Pf
                } else if node.has_class("pc") {
                    PageKind::Pc
                } else {
                    PageKind::Custom
                };
                let dimensions = match self.dimensions.resolve(node) {
                    Ok(size) => size.map(PageDimensions::from),
                    Err(err) => {
                        tracing::warn!(node = marker.node_id, %err, "unusable page dimensions");
                        diagnostics.push(Diagnostic::UnparseableDimension {
                            node: marker.node_id,
                            page: slice.sequence,
                            message: err.to_string(),
                        });
                        None
                    }
                };
                let hierarchy = container_hierarchy(arena, flattened, marker.node_id)?;
                (kind, dimensions, self.dimensions.merged_style(node), hierarchy)
            }
            None => {
                let hierarchy = container_hierarchy(arena, flattened, flattened.root())?;
                (PageKind::Custom, None, BTreeMap::new(), hierarchy)
            }
        };

        let text = utils::get_text_content(arena, slice.page_root)?;

        Ok(PageRecord {
            number: slice.numbering.number(),
            sequence: slice.sequence,
            numbering: slice.numbering,
            number_source: slice.number_source.clone(),
            kind,
            pattern: slice.marker.as_ref().map(|m| m.spec.to_string()),
            dimensions,
            tag_counts: tag_counts(arena, slice.page_root)?,
            container_hierarchy: hierarchy,
            style_rules,
            printed_label: printed_label(&text),
            marker_absorbed: slice.marker_absorbed,
            page_root: slice.page_root,
        })
    }
}

/// Element counts by qualified name below `page_root` (root excluded)
pub fn tag_counts(arena: &DomArena, page_root: NodeId) -> Result<BTreeMap<String, usize>> {
    let mut counts = BTreeMap::new();
    arena.traverse_df(page_root, |node| {
        if node.node_type == NodeType::Element && node.node_id != page_root {
            *counts.entry(node.node_name.clone()).or_insert(0) += 1;
        }
        Ok(())
    })?;
    Ok(counts)
}

/// `node` and its element ancestors as `tag.class1.class2`, innermost first
///
/// Uses the parent map recorded at flattening time, so it reports the
/// original position even after the node has moved.
pub fn container_hierarchy(
    arena: &DomArena,
    flattened: &Flattened,
    node_id: NodeId,
) -> Result<Vec<String>> {
    let mut path = Vec::new();
    for id in flattened.ancestry(node_id) {
        let node = arena.get(id)?;
        if node.is_element() {
            path.push(node.selector_label());
        }
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::{flatten, parse_document};

    #[test]
    fn test_style_type_classification() {
        let styled: String = (0..11).map(|i| format!("<p style=\"top:{}px\">x</p>", i)).collect();

        let inline = parse_document(&format!("<html><body>{}</body></html>", styled)).unwrap();
        assert_eq!(
            DocumentProfile::analyze(&inline, 10).unwrap().style_type,
            Some(StyleType::Inline)
        );

        let mixed = parse_document(&format!(
            "<html><head><style>.a{{}}</style></head><body>{}</body></html>",
            styled
        ))
        .unwrap();
        assert_eq!(
            DocumentProfile::analyze(&mixed, 10).unwrap().style_type,
            Some(StyleType::Mixed)
        );

        let css = parse_document(
            r#"<html><head><link rel="stylesheet" href="a.css"/></head><body/></html>"#,
        )
        .unwrap();
        assert_eq!(
            DocumentProfile::analyze(&css, 10).unwrap().style_type,
            Some(StyleType::Css)
        );

        let plain = parse_document("<html><body><p>x</p></body></html>").unwrap();
        assert_eq!(DocumentProfile::analyze(&plain, 10).unwrap().style_type, None);
    }

    #[test]
    fn test_xbrl_detection() {
        let ixbrl = parse_document(
            r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL"><body/></html>"#,
        )
        .unwrap();
        assert!(DocumentProfile::analyze(&ixbrl, 10).unwrap().has_xbrl);

        let plain = parse_document("<html><body/></html>").unwrap();
        assert!(!DocumentProfile::analyze(&plain, 10).unwrap().has_xbrl);
    }

    #[test]
    fn test_tag_counts_exclude_root() {
        let document =
            parse_document("<html><body><div id=\"r\"><p>a</p><p>b<br/></p></div></body></html>")
                .unwrap();
        let root = document.arena().find_by_id("r")[0];
        let counts = tag_counts(document.arena(), root).unwrap();
        assert_eq!(counts.get("p"), Some(&2));
        assert_eq!(counts.get("br"), Some(&1));
        assert_eq!(counts.get("div"), None);
    }

    #[test]
    fn test_container_hierarchy_order() {
        let document = parse_document(
            r#"<html><body class="b"><div id="page-container" class="wrap main"><div class="pf w0" id="pf1"/></div></body></html>"#,
        )
        .unwrap();
        let arena = document.arena();
        let flattened = flatten(arena, document.content_root()).unwrap();
        let marker = arena.find_by_id("pf1")[0];

        assert_eq!(
            container_hierarchy(arena, &flattened, marker).unwrap(),
            vec!["div.pf.w0", "div.wrap.main", "body.b", "html"]
        );
    }

    #[test]
    fn test_diagnostic_json_shape() {
        let json = serde_json::to_value(Diagnostic::NumberingGaps {
            gaps: vec![3],
            missing: 1,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "kind": "numbering_gaps", "gaps": [3], "missing": 1 })
        );
    }
}
