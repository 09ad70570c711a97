//! Pagination pipeline
//!
//! parse → style rules → scan → flatten → slice → report. Phases run
//! strictly in sequence on one thread; the slicer is the only phase that
//! mutates the document.
//!
//! Page numbers are resolved inside the slice phase, after flattening,
//! because a marker without a number is filed under its rank in flattened
//! order. Resolution only reads marker attributes, so doing it there gives
//! the same numbers as doing it straight after the scan.

use dom::{flatten, Document, DomSerializer, XhtmlParser};

use crate::catalog::CompiledCatalog;
use crate::config::PipelineConfig;
use crate::dimension::DimensionResolver;
use crate::error::Result;
use crate::numbering::PageNumberResolver;
use crate::report::{DocumentProfile, PageManifest, ReportGenerator};
use crate::scanner::MarkerScanner;
use crate::slicer::{PageSlice, PageSlicer};

/// One page as a standalone XHTML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
    pub number: u32,
    pub sequence: usize,
    pub xhtml: String,
}

/// Sliced document plus its manifest
#[derive(Debug, Clone)]
pub struct Pagination {
    /// The document after slicing; page roots live in its arena
    pub document: Document,
    pub manifest: PageManifest,
    pub pages: Vec<PageSlice>,
}

impl Pagination {
    /// Serialize every page with the original head and root declarations
    pub fn page_documents(&self) -> Result<Vec<PageDocument>> {
        let serializer = DomSerializer::new();
        self.pages
            .iter()
            .map(|page| {
                Ok(PageDocument {
                    number: page.numbering.number(),
                    sequence: page.sequence,
                    xhtml: serializer.page_document(&self.document, page.page_root)?,
                })
            })
            .collect()
    }
}

pub struct Paginator {
    config: PipelineConfig,
    catalog: CompiledCatalog,
    parser: XhtmlParser,
}

impl Paginator {
    /// Paginator with the built-in catalog
    pub fn new() -> Result<Self> {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        let catalog = config.compile()?;
        Ok(Self {
            config,
            catalog,
            parser: XhtmlParser::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Parse and paginate; malformed input fails before any phase runs
    pub fn paginate_str(&self, text: &str) -> Result<Pagination> {
        let document = self.parser.parse(text)?;
        self.paginate(document)
    }

    pub fn paginate(&self, mut document: Document) -> Result<Pagination> {
        let span = tracing::info_span!("paginate", nodes = document.arena().len());
        let _enter = span.enter();

        let profile = DocumentProfile::analyze(&document, self.config.inline_style_threshold)?;
        let dimensions = DimensionResolver::from_document(&document)?;

        let scan = MarkerScanner::new(&self.catalog, &dimensions)
            .with_semantic_detection(self.config.semantic_detection)
            .scan(&document)?;
        tracing::info!(
            candidates = scan.candidates.len(),
            semantic = scan.semantic,
            "scanned page markers"
        );

        let flattened = flatten(document.arena(), document.content_root())?;

        let outcome = PageSlicer::new(PageNumberResolver::new(&self.catalog), &dimensions)
            .require_usable_markers(self.config.require_usable_markers)
            .slice(&mut document, &scan.candidates, &flattened)?;

        let manifest = ReportGenerator::new(&dimensions).build(
            &document,
            &flattened,
            &scan,
            &outcome,
            &profile,
        )?;

        Ok(Pagination {
            document,
            manifest,
            pages: outcome.pages,
        })
    }
}

/// Paginate with the default configuration
pub fn paginate(text: &str) -> Result<Pagination> {
    Paginator::new()?.paginate_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PagerError;

    #[test]
    fn test_parse_error_is_fatal() {
        let err = paginate("<html><body><div></body>").unwrap_err();
        assert!(matches!(err, PagerError::Dom(dom::DomError::Parse(_))));
    }

    #[test]
    fn test_page_documents_follow_pages() {
        let pagination = paginate(
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><head><title>T</title></head><body><div id="pf1" class="pf">a</div><div id="pf2" class="pf">b</div></body></html>"#,
        )
        .unwrap();

        let docs = pagination.page_documents().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!((docs[1].number, docs[1].sequence), (2, 2));
        assert!(docs[0].xhtml.contains("<head><title>T</title></head>"));
        assert!(docs[0].xhtml.contains(
            r#"<div class="page_1" data-page-number="1"><div class="pf" id="pf1">a</div></div>"#
        ));
        assert!(!docs[0].xhtml.contains("pf2"));
    }
}
