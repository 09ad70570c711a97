//! Page Number Resolver - page numbers from marker attributes, numbering
//! diagnostics, and printed page labels
//!
//! Resolution never fails: each source is tried in priority order and a
//! failure falls through to the next. `None` means unnumbered, never 0.

use dom::DomNode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use crate::catalog::CompiledCatalog;

/// Where a resolved page number came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "from", content = "name", rename_all = "snake_case")]
pub enum NumberSource {
    Id,
    Attribute(String),
    Class,
}

pub struct PageNumberResolver<'a> {
    catalog: &'a CompiledCatalog,
}

impl<'a> PageNumberResolver<'a> {
    pub fn new(catalog: &'a CompiledCatalog) -> Self {
        Self { catalog }
    }

    pub fn resolve(&self, node: &DomNode) -> Option<u32> {
        self.resolve_with_source(node).map(|(number, _)| number)
    }

    /// Id regexes, then number attributes, then class-token regexes
    pub fn resolve_with_source(&self, node: &DomNode) -> Option<(u32, NumberSource)> {
        if let Some(number) = node.attr("id").and_then(|id| self.match_number(id)) {
            return Some((number, NumberSource::Id));
        }

        for name in self.catalog.number_attributes() {
            let Some(value) = node.attr(name) else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            if let Ok(number) = value.parse() {
                return Some((number, NumberSource::Attribute(name.clone())));
            }
        }

        node.class_list
            .iter()
            .find_map(|class| self.match_number(class))
            .map(|number| (number, NumberSource::Class))
    }

    fn match_number(&self, text: &str) -> Option<u32> {
        self.catalog
            .number_patterns()
            .iter()
            .filter_map(|regex| regex.captures(text))
            .find_map(|caps| caps.get(1)?.as_str().parse().ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingScheme {
    /// No printed numbers, or every printed number matches the physical position
    Sequential,
    /// Some page prints a number other than its physical position
    Mixed,
}

/// Most gap numbers listed in a diagnostic; `missing` still counts them all
pub const MAX_REPORTED_GAPS: usize = 1000;

/// Numbers known for one page, given in physical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageNumbers {
    /// Number the page is filed under, read from the marker or its rank
    pub assigned: u32,
    /// Number read from the marker, if any
    pub resolved: Option<u32>,
    /// Number printed in the page text, if any
    pub printed: Option<u32>,
}

/// Document-level numbering summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberingDiagnostics {
    /// Smallest and largest number read from a marker
    pub min: Option<u32>,
    pub max: Option<u32>,
    /// First missing marker numbers between `min` and `max`, ascending
    pub gaps: Vec<u32>,
    /// Count of every missing number, listed or not
    pub missing: u64,
    pub gaps_truncated: bool,
    /// Filing numbers carried by more than one page
    pub duplicates: Vec<u32>,
    pub unnumbered: usize,
    /// Physical position (1-based) to printed page number
    pub physical_to_document: BTreeMap<usize, u32>,
    pub scheme: NumberingScheme,
}

impl NumberingDiagnostics {
    pub fn has_gaps(&self) -> bool {
        self.missing > 0
    }

    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

/// Summarize the numbers of every page, in physical page order
///
/// Gaps only consider numbers read from markers; duplicates consider the
/// number each page is filed under, sequential ranks included.
pub fn diagnose(pages: &[PageNumbers]) -> NumberingDiagnostics {
    let present: BTreeSet<u32> = pages.iter().filter_map(|page| page.resolved).collect();
    let min = present.first().copied();
    let max = present.last().copied();

    let missing = match (min, max) {
        (Some(min), Some(max)) => u64::from(max - min) + 1 - present.len() as u64,
        _ => 0,
    };
    let mut gaps = Vec::new();
    let mut previous: Option<u32> = None;
    'collect: for &number in &present {
        if let Some(previous) = previous {
            for gap in previous + 1..number {
                if gaps.len() == MAX_REPORTED_GAPS {
                    break 'collect;
                }
                gaps.push(gap);
            }
        }
        previous = Some(number);
    }
    let gaps_truncated = (gaps.len() as u64) < missing;

    let mut occurrences: BTreeMap<u32, usize> = BTreeMap::new();
    for page in pages {
        *occurrences.entry(page.assigned).or_default() += 1;
    }
    let duplicates = occurrences
        .iter()
        .filter(|&(_, &count)| count > 1)
        .map(|(&number, _)| number)
        .collect();

    let physical_to_document: BTreeMap<usize, u32> = pages
        .iter()
        .enumerate()
        .filter_map(|(idx, page)| Some((idx + 1, page.printed?)))
        .collect();
    let scheme = if physical_to_document
        .iter()
        .any(|(&physical, &printed)| physical as u64 != u64::from(printed))
    {
        NumberingScheme::Mixed
    } else {
        NumberingScheme::Sequential
    };

    NumberingDiagnostics {
        min,
        max,
        gaps,
        missing,
        gaps_truncated,
        duplicates,
        unnumbered: pages.iter().filter(|page| page.resolved.is_none()).count(),
        physical_to_document,
        scheme,
    }
}

static RE_PAGE_OF_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bpage\s*(\d+)\s*of\s*(\d+)").expect("valid page-of-total regex")
});

static RE_PAGE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[Pp]age\s*(\d+)").expect("valid page label regex"));

static RE_STANDALONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*$").expect("valid standalone number regex"));

static RE_X_OF_Y: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\s*of\s*(\d+)\b").expect("valid x-of-y regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    PageOfTotal,
    PageLabel,
    Standalone,
    XOfY,
}

/// Page number printed in the page's own text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintedLabel {
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    pub kind: LabelKind,
}

/// First printed label in priority order; informational only
pub fn printed_label(text: &str) -> Option<PrintedLabel> {
    let patterns: [(&Regex, LabelKind); 4] = [
        (&*RE_PAGE_OF_TOTAL, LabelKind::PageOfTotal),
        (&*RE_PAGE_LABEL, LabelKind::PageLabel),
        (&*RE_STANDALONE, LabelKind::Standalone),
        (&*RE_X_OF_Y, LabelKind::XOfY),
    ];

    patterns.iter().find_map(|(regex, kind)| {
        let caps = regex.captures(text)?;
        let number = caps.get(1)?.as_str().parse().ok()?;
        let total = caps.get(2).and_then(|m| m.as_str().parse().ok());
        Some(PrintedLabel {
            number,
            total,
            kind: *kind,
        })
    })
}
