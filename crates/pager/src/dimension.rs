//! Dimension Resolver - page width/height from inline style, class rules
//! and raw attributes
//!
//! Cascade per node:
//! - `.class { ... }` rules from `<style>` blocks, later declarations win
//! - inline `style` overrides every class rule
//! - `width`/`height` attributes only when the merged style lacks the key
//!
//! Orientation policy: `landscape` iff `width_px >= height_px`, else
//! `portrait`. Equal sides are landscape.

use ahash::AHashMap;
use dom::{utils, Document, DomNode};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::catalog::*;
use crate::error::{DimensionError, Result};

static RE_CSS_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid css comment regex"));

static RE_CSS_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^{}]+)\{([^{}]*)\}").expect("valid css rule regex"));

/// Length units understood by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Px,
    Pt,
    Mm,
    Cm,
    In,
}

impl Unit {
    /// Unit from a CSS suffix; an empty suffix means pixels
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "" | "px" => Some(Unit::Px),
            "pt" => Some(Unit::Pt),
            "mm" => Some(Unit::Mm),
            "cm" => Some(Unit::Cm),
            "in" => Some(Unit::In),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Px => "px",
            Unit::Pt => "pt",
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::In => "in",
        }
    }

    fn px_factor(&self) -> f64 {
        match self {
            Unit::Px => PX_PER_PX,
            Unit::Pt => PX_PER_PT,
            Unit::Mm => PX_PER_MM,
            Unit::Cm => PX_PER_CM,
            Unit::In => PX_PER_IN,
        }
    }

    fn pt_factor(&self) -> f64 {
        match self {
            Unit::Px => PT_PER_PX,
            Unit::Pt => PT_PER_PT,
            Unit::Mm => PT_PER_MM,
            Unit::Cm => PT_PER_CM,
            Unit::In => PT_PER_IN,
        }
    }
}

/// A length in its original unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension {
    pub value: f64,
    pub unit: Unit,
}

impl Dimension {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Parse `"210mm"`, `"8.5in"`, `"800"` (numeric prefix + optional unit)
    pub fn parse(text: &str) -> std::result::Result<Self, DimensionError> {
        let trimmed = text.trim();
        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(trimmed.len());
        let (number, suffix) = trimmed.split_at(split);

        let value: f64 = number
            .parse()
            .map_err(|_| DimensionError::Invalid(text.to_string()))?;
        let suffix = suffix.trim();
        let unit = Unit::from_suffix(suffix).ok_or_else(|| DimensionError::UnsupportedUnit {
            value: text.to_string(),
            unit: suffix.to_string(),
        })?;

        Ok(Self { value, unit })
    }

    /// Canonical pixel value
    pub fn to_pixels(&self) -> f64 {
        self.value * self.unit.px_factor()
    }

    /// Value in points, for semantic size thresholds
    pub fn to_points(&self) -> f64 {
        self.value * self.unit.pt_factor()
    }
}

impl FromStr for Dimension {
    type Err = DimensionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn from_pixels(width_px: f64, height_px: f64) -> Self {
        if width_px >= height_px {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Resolved width and height of one page marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: Dimension,
    pub height: Dimension,
}

impl PageSize {
    pub fn width_px(&self) -> f64 {
        self.width.to_pixels()
    }

    pub fn height_px(&self) -> f64 {
        self.height.to_pixels()
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::from_pixels(self.width_px(), self.height_px())
    }
}

#[derive(Debug, Clone)]
struct ClassRule {
    /// Declaration order across every loaded stylesheet
    sequence: usize,
    declarations: Vec<(String, String)>,
}

/// Merges class rules and inline style into per-node dimensions
#[derive(Debug, Clone, Default)]
pub struct DimensionResolver {
    class_rules: AHashMap<String, Vec<ClassRule>>,
    next_sequence: usize,
}

impl DimensionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload the class rules of every `<style>` block in the document
    pub fn from_document(document: &Document) -> Result<Self> {
        let mut resolver = Self::new();
        for css in document.style_texts()? {
            resolver.load_stylesheet(&css);
        }
        tracing::debug!(classes = resolver.class_rules.len(), "loaded class rules");
        Ok(resolver)
    }

    /// Register the `.class` rules of a stylesheet; returns how many were added
    ///
    /// Only selectors that are exactly `.name` are kept. Compound selectors
    /// and at-rule preludes are ignored; rules nested inside at-rules still
    /// register by their own selector.
    pub fn load_stylesheet(&mut self, css: &str) -> usize {
        let css = RE_CSS_COMMENT.replace_all(css, "");
        let mut added = 0;

        for rule in RE_CSS_RULE.captures_iter(&css) {
            let declarations = utils::parse_style_declarations(&rule[2]);
            for selector in rule[1].split(',') {
                let Some(class) = exact_class_selector(selector) else {
                    continue;
                };
                let entry = ClassRule {
                    sequence: self.next_sequence,
                    declarations: declarations.clone(),
                };
                self.next_sequence += 1;
                self.class_rules
                    .entry(class.to_string())
                    .or_default()
                    .push(entry);
                added += 1;
            }
        }

        added
    }

    /// Number of `.class` rules loaded so far
    pub fn rule_count(&self) -> usize {
        self.next_sequence
    }

    /// Class rules in declaration order, then inline style on top
    pub fn merged_style(&self, node: &DomNode) -> BTreeMap<String, String> {
        let mut rules: Vec<&ClassRule> = node
            .class_list
            .iter()
            .filter_map(|class| self.class_rules.get(class))
            .flatten()
            .collect();
        rules.sort_by_key(|rule| rule.sequence);

        let mut merged = BTreeMap::new();
        for rule in rules {
            for (prop, value) in &rule.declarations {
                merged.insert(prop.clone(), value.clone());
            }
        }
        for (prop, value) in utils::parse_style_declarations(&node.style) {
            merged.insert(prop, value);
        }
        merged
    }

    /// Width and height of a node, `None` when either is absent
    ///
    /// An unsupported unit or unparseable value is an error for this node
    /// only; callers treat the node as having no size.
    pub fn resolve(&self, node: &DomNode) -> std::result::Result<Option<PageSize>, DimensionError> {
        let merged = self.merged_style(node);
        let lookup = |key: &str| -> Option<String> {
            merged
                .get(key)
                .cloned()
                .or_else(|| node.attr(key).map(str::to_string))
                .filter(|value| !value.trim().is_empty())
        };

        let (Some(width), Some(height)) = (lookup("width"), lookup("height")) else {
            return Ok(None);
        };

        Ok(Some(PageSize {
            width: Dimension::parse(&width)?,
            height: Dimension::parse(&height)?,
        }))
    }
}

/// `.name` -> `name`; anything else (`div.pf`, `.a .b`, `#id`) -> `None`
fn exact_class_selector(selector: &str) -> Option<&str> {
    let class = selector.trim().strip_prefix('.')?;
    let is_plain = !class.is_empty()
        && class
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
    is_plain.then_some(class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn element(attrs: &[(&str, &str)]) -> DomNode {
        let attributes: HashMap<String, String> = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DomNode::element(0, "div", attributes)
    }

    #[test]
    fn test_unit_conversions() {
        let a4 = Dimension::parse("210mm").unwrap();
        assert!((a4.to_pixels() - 793.7).abs() < 0.01);

        let letter = Dimension::parse("8.5in").unwrap();
        assert!((letter.to_pixels() - 816.0).abs() < 1e-9);

        let pt = Dimension::parse("12pt").unwrap();
        assert!((pt.to_pixels() - 16.0).abs() < 0.01);

        assert!((Dimension::parse("1cm").unwrap().to_pixels() - 37.7953).abs() < 1e-9);
        assert_eq!(Dimension::parse("800").unwrap(), Dimension::new(800.0, Unit::Px));
    }

    #[test]
    fn test_points_conversion() {
        assert!((Dimension::parse("800px").unwrap().to_points() - 600.0).abs() < 1e-9);
        assert!((Dimension::parse("8.5in").unwrap().to_points() - 612.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_failures() {
        assert_eq!(
            Dimension::parse("12em"),
            Err(DimensionError::UnsupportedUnit {
                value: "12em".to_string(),
                unit: "em".to_string()
            })
        );
        assert!(matches!(Dimension::parse("auto"), Err(DimensionError::Invalid(_))));
        assert!(matches!(Dimension::parse("1.2.3px"), Err(DimensionError::Invalid(_))));
    }

    #[test]
    fn test_display_keeps_original_unit() {
        assert_eq!(Dimension::parse("210mm").unwrap().to_string(), "210mm");
        assert_eq!(Dimension::parse(" 8.5in ").unwrap().to_string(), "8.5in");
    }

    #[test]
    fn test_orientation_policy() {
        assert_eq!(Orientation::from_pixels(800.0, 600.0), Orientation::Landscape);
        assert_eq!(Orientation::from_pixels(600.0, 800.0), Orientation::Portrait);
        assert_eq!(Orientation::from_pixels(700.0, 700.0), Orientation::Landscape);
    }

    #[test]
    fn test_inline_style_overrides_class_rules() {
        let mut resolver = DimensionResolver::new();
        resolver.load_stylesheet(".w0 { width: 100px; height: 200px } .h1 { height: 300px }");

        let node = element(&[("class", "w0 h1"), ("style", "width: 150px")]);
        let merged = resolver.merged_style(&node);
        assert_eq!(merged.get("width").map(String::as_str), Some("150px"));
        assert_eq!(merged.get("height").map(String::as_str), Some("300px"));
    }

    #[test]
    fn test_later_declaration_wins_regardless_of_class_order() {
        let mut resolver = DimensionResolver::new();
        resolver.load_stylesheet(".b { width: 1px } /* .a { width: 9px } */");
        resolver.load_stylesheet(".a { width: 2px }");

        // Token order in the class attribute is irrelevant
        let node = element(&[("class", "a b")]);
        assert_eq!(
            resolver.merged_style(&node).get("width").map(String::as_str),
            Some("2px")
        );
        assert_eq!(resolver.rule_count(), 2);
    }

    #[test]
    fn test_compound_selectors_ignored() {
        let mut resolver = DimensionResolver::new();
        let added = resolver.load_stylesheet(
            "div.pf { width: 1px } .pf, .pc { height: 2px } @media print { .pf { width: 3px } }",
        );
        assert_eq!(added, 3);

        let node = element(&[("class", "pf")]);
        let merged = resolver.merged_style(&node);
        assert_eq!(merged.get("width").map(String::as_str), Some("3px"));
        assert_eq!(merged.get("height").map(String::as_str), Some("2px"));
    }

    #[test]
    fn test_resolve_falls_back_to_attributes() {
        let resolver = DimensionResolver::new();
        let node = element(&[("width", "800"), ("style", "height: 11in")]);
        let size = resolver.resolve(&node).unwrap().unwrap();
        assert_eq!(size.width, Dimension::new(800.0, Unit::Px));
        assert_eq!(size.height, Dimension::new(11.0, Unit::In));
        assert_eq!(size.orientation(), Orientation::Portrait);
    }

    #[test]
    fn test_resolve_missing_and_unsupported() {
        let resolver = DimensionResolver::new();
        assert_eq!(resolver.resolve(&element(&[("width", "10px")])).unwrap(), None);

        let bad = element(&[("style", "width: 50%; height: 10px")]);
        assert!(matches!(
            resolver.resolve(&bad),
            Err(DimensionError::UnsupportedUnit { .. })
        ));
    }
}
