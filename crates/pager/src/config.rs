//! Pipeline configuration
//!
//! Plain serde struct with defaults; every field may be omitted in JSON.

use serde::{Deserialize, Serialize};

use crate::catalog::{CompiledCatalog, PatternCatalog};
use crate::error::{PagerError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub catalog: PatternCatalog,
    /// Infer pages from size/attributes when no explicit marker matches
    pub semantic_detection: bool,
    /// Fall back to one page when no marker has a number or a size
    pub require_usable_markers: bool,
    /// Styled elements needed before a document counts as inline-styled
    pub inline_style_threshold: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            catalog: PatternCatalog::default(),
            semantic_detection: true,
            require_usable_markers: true,
            inline_style_threshold: 10,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate and compile the catalog
    pub fn compile(&self) -> Result<CompiledCatalog> {
        let catalog = &self.catalog;
        if catalog.patterns().is_empty() && catalog.semantic_patterns.is_empty() {
            return Err(PagerError::Config(
                "catalog defines no marker patterns".to_string(),
            ));
        }

        let compiled = catalog.compile()?;
        if let Some(regex) = compiled
            .number_patterns()
            .iter()
            .find(|regex| regex.captures_len() < 2)
        {
            return Err(PagerError::Config(format!(
                "number pattern {:?} has no capture group",
                regex.as_str()
            )));
        }
        Ok(compiled)
    }
}
