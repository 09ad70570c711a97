//! XHTML DOM Library
//!
//! Arena-based document tree for paginated XHTML/iXBRL filings.
//!
//! ## Philosophy
//!
//! - **Good taste**: Data structures first, algorithms follow naturally
//! - **Identity by index**: two equal-looking elements are two nodes
//! - **Moves, not copies**: re-parenting rewires indices, nodes never relocate
//!
//! ## Core Design
//!
//! ```text
//! XHTML text → roxmltree (borrowed) → DomArena (owned) → flatten → slice → serialize
//!                                          ↓
//!                                   NodeId (u32)
//! ```

pub mod arena;
pub mod document;
pub mod error;
pub mod flatten;
pub mod parser;
pub mod serializer;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use document::Document;
pub use error::{DomError, Result};
pub use flatten::{flatten, Flattened};
pub use parser::{parse_document, ParserConfig, XhtmlParser};
pub use serializer::{DomSerializer, SerializerConfig};
pub use types::*;
