//! Pattern Catalog - the declarative registry of page-marker heuristics
//!
//! The catalog is plain data (serde, loadable from JSON). Regexes are
//! compiled once into a [`CompiledCatalog`] before a run; matching itself
//! lives in the scanner's single dispatcher over [`PatternSpec`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PagerError, Result};

/// Canonical pixel conversion factors
pub const PX_PER_PX: f64 = 1.0;
pub const PX_PER_PT: f64 = 1.3333;
pub const PX_PER_MM: f64 = 3.77953;
pub const PX_PER_CM: f64 = 37.7953;
pub const PX_PER_IN: f64 = 96.0;

/// Point conversion factors (semantic size thresholds are in points)
pub const PT_PER_PX: f64 = 0.75;
pub const PT_PER_PT: f64 = 1.0;
pub const PT_PER_MM: f64 = 2.83465;
pub const PT_PER_CM: f64 = 28.3465;
pub const PT_PER_IN: f64 = 72.0;

/// One marker heuristic
///
/// Closed set: adding a kind means adding a variant and handling it in
/// every exhaustive match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PatternSpec {
    /// `<div>` carrying this exact class token
    ClassEquals(String),
    /// Raw `style` attribute contains this substring
    StyleContains(String),
    /// `id` attribute matches this regex (search, not full match)
    IdMatches(String),
    /// Element with this tag whose resolved size exceeds both thresholds
    MinimumSize {
        tag: String,
        width_pt: f64,
        height_pt: f64,
    },
    /// Element carrying this attribute
    HasAttribute(String),
}

impl PatternSpec {
    /// Semantic patterns infer pages from shape rather than naming
    pub fn is_semantic(&self) -> bool {
        matches!(
            self,
            PatternSpec::MinimumSize { .. } | PatternSpec::HasAttribute(_)
        )
    }
}

impl fmt::Display for PatternSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternSpec::ClassEquals(class) => write!(f, "div.{}", class),
            PatternSpec::StyleContains(needle) => write!(f, "style*={}", needle),
            PatternSpec::IdMatches(pattern) => write!(f, "id~/{}/", pattern),
            PatternSpec::MinimumSize {
                tag,
                width_pt,
                height_pt,
            } => write!(f, "{}>{}x{}pt", tag, width_pt, height_pt),
            PatternSpec::HasAttribute(name) => write!(f, "[{}]", name),
        }
    }
}

/// Declarative marker catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternCatalog {
    /// Exact class tokens on `<div>`
    pub class_patterns: Vec<String>,
    /// Substrings of the raw `style` attribute
    pub style_patterns: Vec<String>,
    /// Regexes searched in the `id` attribute
    pub id_patterns: Vec<String>,
    /// Page-number regexes; capture group 1 is the number
    pub number_patterns: Vec<String>,
    /// Attributes holding a plain integer page number
    pub number_attributes: Vec<String>,
    /// Tried only when the explicit patterns find nothing
    pub semantic_patterns: Vec<PatternSpec>,
}

impl Default for PatternCatalog {
    fn default() -> Self {
        let number_attributes = vec![
            "data-page-number".to_string(),
            "data-page".to_string(),
            "page-number".to_string(),
        ];

        let mut semantic_patterns = vec![PatternSpec::MinimumSize {
            tag: "div".to_string(),
            width_pt: 400.0,
            height_pt: 400.0,
        }];
        semantic_patterns.extend(
            number_attributes
                .iter()
                .map(|name| PatternSpec::HasAttribute(name.clone())),
        );

        Self {
            class_patterns: [
                "pf",
                "page",
                "pageView",
                "pp-class-0",
                "sheet",
                "pdf-page",
                "page-container",
                "page-wrapper",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            style_patterns: [
                "page-break-before",
                "page-break-after",
                "break-before",
                "break-after",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            id_patterns: [r"pf\d+", r"page\d+", r"pg\d+"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            number_patterns: [r"pf(\d+)", r"page[_-]?(\d+)", r"pg[_-]?(\d+)", r"^(\d+)$"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            number_attributes,
            semantic_patterns,
        }
    }
}

impl PatternCatalog {
    /// Load a catalog from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Explicit patterns in catalog order: class, then style, then id
    pub fn patterns(&self) -> Vec<PatternSpec> {
        let classes = self
            .class_patterns
            .iter()
            .map(|c| PatternSpec::ClassEquals(c.clone()));
        let styles = self
            .style_patterns
            .iter()
            .map(|s| PatternSpec::StyleContains(s.clone()));
        let ids = self
            .id_patterns
            .iter()
            .map(|p| PatternSpec::IdMatches(p.clone()));
        classes.chain(styles).chain(ids).collect()
    }

    /// Compile every regex once
    pub fn compile(&self) -> Result<CompiledCatalog> {
        let explicit = self
            .patterns()
            .into_iter()
            .map(CompiledPattern::new)
            .collect::<Result<Vec<_>>>()?;
        let semantic = self
            .semantic_patterns
            .iter()
            .cloned()
            .map(CompiledPattern::new)
            .collect::<Result<Vec<_>>>()?;
        let number_patterns = self
            .number_patterns
            .iter()
            .map(|p| compile_regex(p))
            .collect::<Result<Vec<_>>>()?;

        Ok(CompiledCatalog {
            explicit,
            semantic,
            number_patterns,
            number_attributes: self.number_attributes.clone(),
        })
    }
}

fn compile_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| PagerError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// A [`PatternSpec`] with its regex compiled (for `IdMatches`)
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub spec: PatternSpec,
    id_regex: Option<Regex>,
}

impl CompiledPattern {
    fn new(spec: PatternSpec) -> Result<Self> {
        let id_regex = match &spec {
            PatternSpec::IdMatches(pattern) => Some(compile_regex(pattern)?),
            _ => None,
        };
        Ok(Self { spec, id_regex })
    }

    /// Compiled regex of an `IdMatches` pattern
    pub fn id_regex(&self) -> Option<&Regex> {
        self.id_regex.as_ref()
    }
}

/// Catalog ready for matching
#[derive(Debug, Clone)]
pub struct CompiledCatalog {
    explicit: Vec<CompiledPattern>,
    semantic: Vec<CompiledPattern>,
    number_patterns: Vec<Regex>,
    number_attributes: Vec<String>,
}

impl CompiledCatalog {
    pub fn explicit(&self) -> &[CompiledPattern] {
        &self.explicit
    }

    pub fn semantic(&self) -> &[CompiledPattern] {
        &self.semantic
    }

    pub fn number_patterns(&self) -> &[Regex] {
        &self.number_patterns
    }

    pub fn number_attributes(&self) -> &[String] {
        &self.number_attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern_order() {
        let patterns = PatternCatalog::default().patterns();
        assert_eq!(patterns[0], PatternSpec::ClassEquals("pf".to_string()));
        assert_eq!(patterns.len(), 8 + 4 + 3);
        assert_eq!(
            patterns.last(),
            Some(&PatternSpec::IdMatches(r"pg\d+".to_string()))
        );
    }

    #[test]
    fn test_default_catalog_compiles() {
        let compiled = PatternCatalog::default().compile().unwrap();
        assert_eq!(compiled.explicit().len(), 15);
        assert_eq!(compiled.semantic().len(), 4);
        assert!(compiled.semantic().iter().all(|p| p.spec.is_semantic()));
        assert_eq!(compiled.number_patterns().len(), 4);
    }

    #[test]
    fn test_invalid_regex_is_reported() {
        let catalog = PatternCatalog {
            id_patterns: vec!["pf(".to_string()],
            ..PatternCatalog::default()
        };
        let err = catalog.compile().unwrap_err();
        assert!(matches!(err, PagerError::InvalidPattern { ref pattern, .. } if pattern == "pf("));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let catalog =
            PatternCatalog::from_json_str(r#"{ "class_patterns": ["leaf"] }"#).unwrap();
        assert_eq!(catalog.class_patterns, vec!["leaf".to_string()]);
        assert_eq!(catalog.id_patterns, PatternCatalog::default().id_patterns);
    }

    #[test]
    fn test_semantic_patterns_json_shape() {
        let json = serde_json::to_value(PatternSpec::HasAttribute("data-page".into())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "kind": "has_attribute", "value": "data-page" })
        );
    }
}
