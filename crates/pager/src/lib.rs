//! Page Reconstruction for paginated XHTML
//!
//! Recovers logical pages from a single flat XHTML/iXBRL document whose
//! pages are only hinted at by markers (classes, page-break styles, ids,
//! element sizes), then moves each page's nodes under its own root.
//!
//! ## Philosophy
//!
//! - **Deterministic**: same document, same catalog, same manifest
//! - **Auditable**: every competing heuristic leaves a trace in the manifest
//! - **Fallback, not failure**: no markers means one page, never an error
//!
//! ```text
//! Document → DimensionResolver → MarkerScanner → flatten → PageSlicer → ReportGenerator
//!                                     ↑                        ↑
//!                              CompiledCatalog         PageNumberResolver
//! ```

pub mod catalog;
pub mod config;
pub mod dimension;
pub mod error;
pub mod numbering;
pub mod pipeline;
pub mod report;
pub mod scanner;
pub mod slicer;

pub use catalog::{CompiledCatalog, PatternCatalog, PatternSpec};
pub use config::PipelineConfig;
pub use dimension::{Dimension, DimensionResolver, Orientation, PageSize, Unit};
pub use error::{DimensionError, PagerError, Result};
pub use numbering::{
    diagnose, NumberingDiagnostics, NumberingScheme, PageNumberResolver, PageNumbers,
    MAX_REPORTED_GAPS,
};
pub use pipeline::{paginate, PageDocument, Pagination, Paginator};
pub use report::{Diagnostic, PageManifest, PageRecord, ReportGenerator};
pub use scanner::{MarkerCandidate, MarkerScanner, ScanResult};
pub use slicer::{
    FallbackReason, PageNumbering, PageSlice, PageSlicer, SliceOutcome, SplitContainer,
};
