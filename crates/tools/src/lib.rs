//! Filesystem side of page extraction: output layout and file naming.

pub mod writer;

pub use writer::{PageWriter, document_dir, page_file_name};
