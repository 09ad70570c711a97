//! Marker Scanner - applies the pattern catalog to a parsed document
//!
//! Pure with respect to the document: scanning the same unmodified tree
//! twice gives identical results. Candidates are deduplicated by node
//! identity only; containment between markers is the slicer's problem.

use dom::{Document, DomNode, DomSerializer, NodeId};
use serde::Serialize;

use crate::catalog::{CompiledCatalog, CompiledPattern, PatternSpec};
use crate::dimension::DimensionResolver;
use crate::error::Result;

/// Length of the serialized example kept per pattern
pub const EXAMPLE_LENGTH: usize = 200;

/// A node flagged as the start of a page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerCandidate {
    pub node_id: NodeId,
    /// First pattern (in catalog order) that matched this node
    pub spec: PatternSpec,
    pub semantic: bool,
}

/// Raw match statistics for one pattern, before deduplication
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternHit {
    pub pattern: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Output of one scan
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanResult {
    /// One entry per distinct node, in document order
    pub candidates: Vec<MarkerCandidate>,
    /// Per-pattern statistics for every pass that ran
    pub hits: Vec<PatternHit>,
    /// Whether the candidates came from the semantic pass
    pub semantic: bool,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

pub struct MarkerScanner<'a> {
    catalog: &'a CompiledCatalog,
    dimensions: &'a DimensionResolver,
    semantic_detection: bool,
    serializer: DomSerializer,
}

impl<'a> MarkerScanner<'a> {
    pub fn new(catalog: &'a CompiledCatalog, dimensions: &'a DimensionResolver) -> Self {
        Self {
            catalog,
            dimensions,
            semantic_detection: true,
            serializer: DomSerializer::new(),
        }
    }

    /// Enable or disable the semantic fallback pass
    pub fn with_semantic_detection(mut self, enabled: bool) -> Self {
        self.semantic_detection = enabled;
        self
    }

    /// Explicit patterns first; semantic patterns only when those find nothing
    pub fn scan(&self, document: &Document) -> Result<ScanResult> {
        let elements = document.elements()?;

        let (candidates, mut hits) = self.run_pass(document, &elements, self.catalog.explicit())?;
        if !candidates.is_empty() || !self.semantic_detection {
            tracing::debug!(candidates = candidates.len(), "explicit marker scan");
            return Ok(ScanResult {
                candidates,
                hits,
                semantic: false,
            });
        }

        let (candidates, semantic_hits) =
            self.run_pass(document, &elements, self.catalog.semantic())?;
        hits.extend(semantic_hits);
        tracing::debug!(candidates = candidates.len(), "semantic marker scan");

        Ok(ScanResult {
            candidates,
            hits,
            semantic: true,
        })
    }

    fn run_pass(
        &self,
        document: &Document,
        elements: &[NodeId],
        patterns: &[CompiledPattern],
    ) -> Result<(Vec<MarkerCandidate>, Vec<PatternHit>)> {
        let mut counts = vec![0usize; patterns.len()];
        let mut examples: Vec<Option<NodeId>> = vec![None; patterns.len()];
        let mut candidates = Vec::new();

        for &node_id in elements {
            let node = document.node(node_id)?;
            let mut first_match: Option<&CompiledPattern> = None;

            for (idx, pattern) in patterns.iter().enumerate() {
                if !self.matches(pattern, node) {
                    continue;
                }
                counts[idx] += 1;
                examples[idx].get_or_insert(node_id);
                first_match.get_or_insert(pattern);
            }

            if let Some(pattern) = first_match {
                candidates.push(MarkerCandidate {
                    node_id,
                    spec: pattern.spec.clone(),
                    semantic: pattern.spec.is_semantic(),
                });
            }
        }

        let mut hits = Vec::with_capacity(patterns.len());
        for (idx, pattern) in patterns.iter().enumerate() {
            let example = match examples[idx] {
                Some(node_id) => Some(self.serializer.snippet(
                    document.arena(),
                    node_id,
                    EXAMPLE_LENGTH,
                )?),
                None => None,
            };
            hits.push(PatternHit {
                pattern: pattern.spec.to_string(),
                count: counts[idx],
                example,
            });
        }

        Ok((candidates, hits))
    }

    /// Single dispatcher over every pattern kind
    pub fn matches(&self, pattern: &CompiledPattern, node: &DomNode) -> bool {
        if !node.is_element() {
            return false;
        }

        match &pattern.spec {
            PatternSpec::ClassEquals(class) => node.local_name() == "div" && node.has_class(class),
            PatternSpec::StyleContains(needle) => node.style.contains(needle.as_str()),
            PatternSpec::IdMatches(_) => match (node.attr("id"), pattern.id_regex()) {
                (Some(id), Some(regex)) => regex.is_match(id),
                _ => false,
            },
            PatternSpec::MinimumSize {
                tag,
                width_pt,
                height_pt,
            } => {
                if !node.local_name().eq_ignore_ascii_case(tag) {
                    return false;
                }
                match self.dimensions.resolve(node) {
                    Ok(Some(size)) => {
                        size.width.to_points() > *width_pt && size.height.to_points() > *height_pt
                    }
                    _ => false,
                }
            }
            PatternSpec::HasAttribute(name) => node.attributes.contains_key(name),
        }
    }
}
