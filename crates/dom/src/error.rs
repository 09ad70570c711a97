//! Error types for DOM operations
//!
//! Simple, flat error hierarchy. No over-engineering.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Document has no <{0}> element")]
    MissingElement(&'static str),
}

impl From<roxmltree::Error> for DomError {
    fn from(err: roxmltree::Error) -> Self {
        DomError::Parse(err.to_string())
    }
}
