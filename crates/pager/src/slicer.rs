//! Page Slicer - partitions the flattened document into page subtrees
//!
//! Markers sorted by flattened index open contiguous ranges. Every node of a
//! range that is not yet claimed moves (with its subtree) under a fresh page
//! root; nodes already carried along by an earlier move are skipped. A
//! container whose subtree runs into the next range stays in the original
//! tree and its children are visited one by one instead.
//!
//! Page numbers are resolved here rather than before flattening: a marker
//! without a number is filed under its rank in flattened order.
//!
//! Ownership is tracked in a claimed table indexed by NodeId, never by
//! marking nodes. A node claimed twice, or a range left unclaimed, is a
//! [`PagerError::SliceCoverage`] error.
//!
//! Nested markers: a marker inside an earlier page's subtree travels with
//! that page. Its own range still collects whatever follows the enclosing
//! marker; if nothing is left the marker yields no page.

use dom::{Document, DomNode, Flattened, NodeId};
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Range;

use crate::dimension::DimensionResolver;
use crate::error::{PagerError, Result};
use crate::numbering::{NumberSource, PageNumberResolver};
use crate::scanner::MarkerCandidate;

/// Exactly one numbering path per page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum PageNumbering {
    /// Number read from the marker
    Resolved(u32),
    /// Rank of the marker among all markers in flattened order (1-based)
    Sequential(u32),
}

impl PageNumbering {
    pub fn number(&self) -> u32 {
        match self {
            PageNumbering::Resolved(n) | PageNumbering::Sequential(n) => *n,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, PageNumbering::Resolved(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    NoMarkers,
    NoUsableMarkers,
}

/// One page carved out of the document
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice {
    /// Position among emitted pages (1-based)
    pub sequence: usize,
    pub numbering: PageNumbering,
    pub number_source: Option<NumberSource>,
    /// `None` for the fallback page
    pub marker: Option<MarkerCandidate>,
    /// Synthetic root owning the moved nodes; detached from the document tree
    pub page_root: NodeId,
    /// Flattened index range this page was cut from
    pub range: Range<usize>,
    /// Top-level nodes moved under `page_root`, in original order
    pub moved: Vec<NodeId>,
    /// The opening marker was already moved with an earlier page
    pub marker_absorbed: bool,
}

/// A marker carried into an earlier page by its ancestor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AbsorbedMarker {
    pub node: NodeId,
    /// Sequence of the page that owns the marker
    pub page: usize,
}

/// A container left in the original tree because it spans two pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitContainer {
    pub node: NodeId,
    /// Sequence of the page whose range holds the container
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SliceOutcome {
    pub pages: Vec<PageSlice>,
    pub absorbed: Vec<AbsorbedMarker>,
    pub split: Vec<SplitContainer>,
    /// Candidates outside the flattened subtree (e.g. in `<head>`)
    pub outside: Vec<NodeId>,
    /// Flattened nodes before the first marker, left in the original tree
    pub preamble_nodes: usize,
    pub fallback: Option<FallbackReason>,
}

/// A marker with its flattened position and page number decided
struct PlannedPage<'m> {
    position: usize,
    marker: &'m MarkerCandidate,
    numbering: PageNumbering,
    source: Option<NumberSource>,
}

pub struct PageSlicer<'a> {
    numbers: PageNumberResolver<'a>,
    dimensions: &'a DimensionResolver,
    require_usable_markers: bool,
}

impl<'a> PageSlicer<'a> {
    pub fn new(numbers: PageNumberResolver<'a>, dimensions: &'a DimensionResolver) -> Self {
        Self {
            numbers,
            dimensions,
            require_usable_markers: true,
        }
    }

    /// Fall back to one page when no marker has a number or a size
    pub fn require_usable_markers(mut self, required: bool) -> Self {
        self.require_usable_markers = required;
        self
    }

    /// Cut `document` into pages; `flattened` must describe the unmodified tree
    pub fn slice(
        &self,
        document: &mut Document,
        markers: &[MarkerCandidate],
        flattened: &Flattened,
    ) -> Result<SliceOutcome> {
        let mut located = Vec::with_capacity(markers.len());
        let mut outside = Vec::new();
        for marker in markers {
            match flattened.position_of(marker.node_id) {
                Some(position) => located.push((position, marker)),
                None => outside.push(marker.node_id),
            }
        }
        if !outside.is_empty() {
            tracing::debug!(count = outside.len(), "markers outside the sliced subtree");
        }

        if located.is_empty() {
            tracing::warn!("no page markers found, emitting the whole body as one page");
            return self.fallback(document, flattened, FallbackReason::NoMarkers, outside);
        }

        located.sort_by_key(|(position, _)| *position);

        let mut usable = false;
        let mut planned = Vec::with_capacity(located.len());
        for (rank, (position, marker)) in located.into_iter().enumerate() {
            let node = document.node(marker.node_id)?;
            let resolved = self.numbers.resolve_with_source(node);
            usable |= resolved.is_some() || self.has_size(node);

            let (numbering, source) = match resolved {
                Some((number, source)) => (PageNumbering::Resolved(number), Some(source)),
                None => (PageNumbering::Sequential(rank as u32 + 1), None),
            };
            planned.push(PlannedPage {
                position,
                marker,
                numbering,
                source,
            });
        }

        if self.require_usable_markers && !usable {
            tracing::warn!(
                markers = planned.len(),
                "no marker has a page number or size, emitting the whole body as one page"
            );
            return self.fallback(document, flattened, FallbackReason::NoUsableMarkers, outside);
        }

        planned.sort_by_key(|page| (page.position, page.numbering.number()));

        let starts: Vec<usize> = planned.iter().map(|page| page.position).collect();
        let first_start = starts[0];
        let mut claims = ClaimTable::new(document.arena().len());
        let mut outcome = SliceOutcome {
            outside,
            preamble_nodes: first_start,
            ..SliceOutcome::default()
        };

        for (idx, page) in planned.into_iter().enumerate() {
            let end = starts.get(idx + 1).copied().unwrap_or(flattened.len());
            let range = page.position..end;
            let sequence = outcome.pages.len() + 1;

            let absorbed_by = claims.owner(page.marker.node_id);
            if let Some(owner) = absorbed_by {
                tracing::warn!(
                    node = page.marker.node_id,
                    page = owner,
                    "nested marker already moved with an earlier page"
                );
                outcome.absorbed.push(AbsorbedMarker {
                    node: page.marker.node_id,
                    page: owner,
                });
            }

            let mut moved = Vec::new();
            for index in range.clone() {
                let Some(node_id) = flattened.node_at(index) else {
                    continue;
                };
                if claims.is_claimed(node_id) {
                    continue;
                }
                let subtree = document.arena().subtree_ids(node_id)?;
                if index != range.start && index + subtree.len() > range.end {
                    tracing::debug!(node = node_id, page = sequence, "container spans two pages");
                    claims.split(node_id, sequence)?;
                    outcome.split.push(SplitContainer {
                        node: node_id,
                        page: sequence,
                    });
                    continue;
                }
                for id in subtree {
                    claims.claim(id, sequence)?;
                }
                moved.push(node_id);
            }

            if moved.is_empty() {
                continue;
            }

            let number = page.numbering.number();
            let page_root = create_page_root(document, &format!("page_{}", number), number);
            for &node_id in &moved {
                document.arena_mut().move_node(node_id, page_root)?;
            }

            tracing::debug!(sequence, number, nodes = moved.len(), "sliced page");
            outcome.pages.push(PageSlice {
                sequence,
                numbering: page.numbering,
                number_source: page.source,
                marker: Some(page.marker.clone()),
                page_root,
                range,
                moved,
                marker_absorbed: absorbed_by.is_some(),
            });
        }

        claims.verify_covered(flattened, first_start)?;
        Ok(outcome)
    }

    fn has_size(&self, node: &DomNode) -> bool {
        matches!(self.dimensions.resolve(node), Ok(Some(_)))
    }

    /// Single page holding every child of the content root
    fn fallback(
        &self,
        document: &mut Document,
        flattened: &Flattened,
        reason: FallbackReason,
        outside: Vec<NodeId>,
    ) -> Result<SliceOutcome> {
        let head = document.head();
        let children: Vec<NodeId> = document
            .node(document.content_root())?
            .children_ids
            .iter()
            .copied()
            .filter(|&id| Some(id) != head)
            .collect();

        let page_root = create_page_root(document, "fallback_page_1", 1);
        for &node_id in &children {
            document.arena_mut().move_node(node_id, page_root)?;
        }

        Ok(SliceOutcome {
            pages: vec![PageSlice {
                sequence: 1,
                numbering: PageNumbering::Sequential(1),
                number_source: None,
                marker: None,
                page_root,
                range: 0..flattened.len(),
                moved: children,
                marker_absorbed: false,
            }],
            absorbed: Vec::new(),
            split: Vec::new(),
            outside,
            preamble_nodes: 0,
            fallback: Some(reason),
        })
    }
}

/// `<div class="..." data-page-number="n">`, appended to the arena unattached
fn create_page_root(document: &mut Document, class: &str, number: u32) -> NodeId {
    let mut attributes = HashMap::new();
    attributes.insert("class".to_string(), class.to_string());
    attributes.insert("data-page-number".to_string(), number.to_string());
    document
        .arena_mut()
        .add_node(DomNode::element(0, "div", attributes))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    /// Moved into the page with this sequence
    Page(usize),
    /// Left in the original tree, spanning the page with this sequence and the next
    Split(usize),
}

impl Claim {
    fn page(self) -> usize {
        match self {
            Claim::Page(page) | Claim::Split(page) => page,
        }
    }
}

/// Which page (by sequence) owns each original node
struct ClaimTable {
    owners: Vec<Option<Claim>>,
}

impl ClaimTable {
    fn new(len: usize) -> Self {
        Self {
            owners: vec![None; len],
        }
    }

    /// Page a node was moved into; split containers have no owner
    fn owner(&self, node_id: NodeId) -> Option<usize> {
        match self.owners.get(node_id as usize).copied().flatten() {
            Some(Claim::Page(page)) => Some(page),
            _ => None,
        }
    }

    fn is_claimed(&self, node_id: NodeId) -> bool {
        matches!(self.owners.get(node_id as usize), Some(Some(_)))
    }

    fn claim(&mut self, node_id: NodeId, page: usize) -> Result<()> {
        self.set(node_id, Claim::Page(page))
    }

    fn split(&mut self, node_id: NodeId, page: usize) -> Result<()> {
        self.set(node_id, Claim::Split(page))
    }

    fn set(&mut self, node_id: NodeId, claim: Claim) -> Result<()> {
        let slot = self.owners.get_mut(node_id as usize).ok_or_else(|| {
            PagerError::SliceCoverage(format!("node {} is outside the original tree", node_id))
        })?;
        if let Some(existing) = *slot {
            return Err(PagerError::SliceCoverage(format!(
                "node {} claimed by page {} and page {}",
                node_id,
                existing.page(),
                claim.page()
            )));
        }
        *slot = Some(claim);
        Ok(())
    }

    /// Every flattened index from the first marker on belongs to some page
    fn verify_covered(&self, flattened: &Flattened, from: usize) -> Result<()> {
        for (index, &node_id) in flattened.order().iter().enumerate().skip(from) {
            if !self.is_claimed(node_id) {
                return Err(PagerError::SliceCoverage(format!(
                    "flattened index {} (node {}) belongs to no page",
                    index, node_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CompiledCatalog, PatternCatalog};
    use crate::scanner::MarkerScanner;
    use dom::{flatten, parse_document, utils};

    struct Fixture {
        document: Document,
        catalog: CompiledCatalog,
        dimensions: DimensionResolver,
    }

    fn fixture(text: &str) -> Fixture {
        let document = parse_document(text).unwrap();
        let catalog = PatternCatalog::default().compile().unwrap();
        let dimensions = DimensionResolver::from_document(&document).unwrap();
        Fixture {
            document,
            catalog,
            dimensions,
        }
    }

    fn run(fx: &mut Fixture) -> SliceOutcome {
        let markers = MarkerScanner::new(&fx.catalog, &fx.dimensions)
            .scan(&fx.document)
            .unwrap()
            .candidates;
        let flattened = flatten(fx.document.arena(), fx.document.content_root()).unwrap();
        PageSlicer::new(PageNumberResolver::new(&fx.catalog), &fx.dimensions)
            .slice(&mut fx.document, &markers, &flattened)
            .unwrap()
    }

    fn page_text(document: &Document, page: &PageSlice) -> String {
        utils::get_text_content(document.arena(), page.page_root).unwrap()
    }

    #[test]
    fn test_sibling_markers_partition() {
        let mut fx = fixture(
            r#"<html><body><div id="pf1" class="pf">a</div><div id="pf2" class="pf">b<p>c</p></div></body></html>"#,
        );
        let outcome = run(&mut fx);

        assert_eq!(outcome.pages.len(), 2);
        assert_eq!(outcome.pages[0].range, 0..2);
        assert_eq!(outcome.pages[1].range, 2..6);
        assert_eq!(outcome.pages[0].numbering, PageNumbering::Resolved(1));
        assert_eq!(outcome.pages[1].number_source, Some(NumberSource::Id));
        assert_eq!(page_text(&fx.document, &outcome.pages[1]), "bc");

        // Moved nodes are no longer reachable from the body
        let body = fx.document.body().unwrap();
        assert!(fx.document.node(body).unwrap().children_ids.is_empty());
        let root = fx.document.node(outcome.pages[0].page_root).unwrap();
        assert_eq!(root.attr("class"), Some("page_1"));
        assert_eq!(root.parent_id, None);
    }

    #[test]
    fn test_unnumbered_markers_use_rank() {
        let mut fx = fixture(
            r#"<html><head><style>.pf{width:800px;height:600px}</style></head><body><div class="pf">a</div><div class="pf">b</div></body></html>"#,
        );
        let outcome = run(&mut fx);
        let numbering: Vec<PageNumbering> = outcome.pages.iter().map(|p| p.numbering).collect();
        assert_eq!(
            numbering,
            vec![PageNumbering::Sequential(1), PageNumbering::Sequential(2)]
        );
        assert_eq!(outcome.fallback, None);
    }

    #[test]
    fn test_unusable_markers_fall_back() {
        let mut fx = fixture(
            r#"<html><body><div class="pf">a</div><div class="pf">b</div></body></html>"#,
        );
        let outcome = run(&mut fx);
        assert_eq!(outcome.fallback, Some(FallbackReason::NoUsableMarkers));
        assert_eq!(outcome.pages.len(), 1);
        assert_eq!(page_text(&fx.document, &outcome.pages[0]), "ab");
    }

    #[test]
    fn test_usability_check_can_be_disabled() {
        let mut fx = fixture(
            r#"<html><body><div class="pf">a</div><div class="pf">b</div></body></html>"#,
        );
        let markers = MarkerScanner::new(&fx.catalog, &fx.dimensions)
            .scan(&fx.document)
            .unwrap()
            .candidates;
        let flattened = flatten(fx.document.arena(), fx.document.content_root()).unwrap();
        let outcome = PageSlicer::new(PageNumberResolver::new(&fx.catalog), &fx.dimensions)
            .require_usable_markers(false)
            .slice(&mut fx.document, &markers, &flattened)
            .unwrap();
        assert_eq!(outcome.pages.len(), 2);
    }

    #[test]
    fn test_no_markers_single_page() {
        let mut fx = fixture("<html><head><title>t</title></head><body><p>one</p><p>two</p></body></html>");
        let outcome = run(&mut fx);
        assert_eq!(outcome.fallback, Some(FallbackReason::NoMarkers));
        assert_eq!(outcome.pages.len(), 1);
        assert_eq!(outcome.pages[0].numbering, PageNumbering::Sequential(1));
        assert_eq!(outcome.pages[0].moved.len(), 2);
        let root = fx.document.node(outcome.pages[0].page_root).unwrap();
        assert_eq!(root.attr("class"), Some("fallback_page_1"));
    }

    #[test]
    fn test_preamble_and_wrapper_stay_behind() {
        let mut fx = fixture(
            r#"<html><body><p>cover</p><div id="page-container"><div id="pf1" class="pf">a</div><div id="pf2" class="pf">b</div></div></body></html>"#,
        );
        let outcome = run(&mut fx);
        assert_eq!(outcome.preamble_nodes, 3);
        assert_eq!(outcome.pages.len(), 2);

        let container = fx.document.arena().find_by_id("page-container")[0];
        let container = fx.document.node(container).unwrap();
        assert!(container.children_ids.is_empty());
        assert_eq!(container.parent_id, fx.document.body());
    }

    #[test]
    fn test_nested_marker_is_absorbed() {
        let mut fx = fixture(
            r#"<html><body><div id="pf1" class="pf"><p>a</p><div id="pf2" class="pf"><p>b</p></div></div><p>tail</p></body></html>"#,
        );
        let outcome = run(&mut fx);

        assert_eq!(outcome.pages.len(), 2);
        assert_eq!(page_text(&fx.document, &outcome.pages[0]), "ab");
        assert_eq!(page_text(&fx.document, &outcome.pages[1]), "tail");
        assert_eq!(outcome.pages[1].numbering, PageNumbering::Resolved(2));

        let pf2 = fx.document.arena().find_by_id("pf2")[0];
        assert_eq!(outcome.absorbed, vec![AbsorbedMarker { node: pf2, page: 1 }]);
    }

    #[test]
    fn test_container_spanning_two_pages_stays_behind() {
        let mut fx = fixture(
            r#"<html><body><div id="pf1" class="pf">a</div><section><p>b</p><div id="pf2" class="pf">c</div></section></body></html>"#,
        );
        let outcome = run(&mut fx);

        assert_eq!(outcome.pages.len(), 2);
        assert_eq!(page_text(&fx.document, &outcome.pages[0]), "ab");
        assert_eq!(page_text(&fx.document, &outcome.pages[1]), "c");
        assert_eq!(outcome.pages[1].numbering, PageNumbering::Resolved(2));
        assert!(outcome.absorbed.is_empty());
        assert_eq!(outcome.pages[0].range.end, outcome.pages[1].range.start);

        let section = fx.document.arena().find_by_tag("section")[0];
        assert_eq!(
            outcome.split,
            vec![SplitContainer {
                node: section,
                page: 1
            }]
        );
        let section = fx.document.node(section).unwrap();
        assert!(section.children_ids.is_empty());
        assert_eq!(section.parent_id, fx.document.body());
    }

    #[test]
    fn test_nested_marker_page_is_flagged() {
        let mut fx = fixture(
            r#"<html><body><div id="pf1" class="pf"><div id="pf2" class="pf">b</div></div><p>tail</p></body></html>"#,
        );
        let outcome = run(&mut fx);
        assert!(!outcome.pages[0].marker_absorbed);
        assert!(outcome.pages[1].marker_absorbed);
    }

    #[test]
    fn test_nested_marker_without_tail_yields_no_page() {
        let mut fx = fixture(
            r#"<html><body><div id="pf1" class="pf"><div id="pf2" class="pf">b</div></div></body></html>"#,
        );
        let outcome = run(&mut fx);
        assert_eq!(outcome.pages.len(), 1);
        assert_eq!(outcome.absorbed.len(), 1);
    }

    #[test]
    fn test_duplicate_ids_are_distinct_pages() {
        let mut fx = fixture(
            r#"<html><body><div id="pf1" class="pf">a</div><div id="pf1" class="pf">b</div></body></html>"#,
        );
        let outcome = run(&mut fx);
        assert_eq!(outcome.pages.len(), 2);
        assert!(outcome
            .pages
            .iter()
            .all(|p| p.numbering == PageNumbering::Resolved(1)));
        assert_eq!(
            outcome.pages.iter().map(|p| p.sequence).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_double_claim_is_coverage_error() {
        let mut claims = ClaimTable::new(2);
        claims.claim(1, 1).unwrap();
        assert!(matches!(claims.claim(1, 2), Err(PagerError::SliceCoverage(_))));
        assert!(matches!(claims.split(1, 2), Err(PagerError::SliceCoverage(_))));
        assert!(matches!(claims.claim(5, 1), Err(PagerError::SliceCoverage(_))));
    }
}
