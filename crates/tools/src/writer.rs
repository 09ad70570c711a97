//! Page Writer - persists sliced pages and the manifest
//!
//! Layout: `<base>/<input stem>/page_001.xhtml ... manifest.json`, where
//! `<base>` defaults to `extracted_pages/` next to the input. When two pages
//! share a number every file also carries its sequence: `page_001_002.xhtml`.

use anyhow::{Context, Result};
use pager::{PageDocument, PageManifest};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const DEFAULT_EXTENSION: &str = "xhtml";

/// `page_<number:03>.<ext>`, or `page_<number:03>_<sequence:03>.<ext>` when disambiguating
pub fn page_file_name(number: u32, sequence: usize, extension: &str, disambiguate: bool) -> String {
    if disambiguate {
        format!("page_{:03}_{:03}.{}", number, sequence, extension)
    } else {
        format!("page_{:03}.{}", number, extension)
    }
}

/// One directory per source document
pub fn document_dir(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let base = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("extracted_pages"),
    };
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    base.join(stem)
}

pub struct PageWriter {
    dir: PathBuf,
    extension: String,
}

impl PageWriter {
    /// Writer for `dir`, created if missing
    pub fn create(dir: &Path, extension: &str) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_pages(&self, pages: &[PageDocument], disambiguate: bool) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(pages.len());
        for page in pages {
            let name = page_file_name(page.number, page.sequence, &self.extension, disambiguate);
            let path = self.dir.join(name);
            fs::write(&path, &page.xhtml)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::debug!(path = %path.display(), "wrote page");
            written.push(path);
        }
        Ok(written)
    }

    pub fn write_manifest(&self, manifest: &PageManifest) -> Result<PathBuf> {
        let path = self.dir.join(MANIFEST_FILE);
        let json = manifest.to_json_pretty().context("Failed to serialize manifest")?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_file_name() {
        assert_eq!(page_file_name(7, 1, "xhtml", false), "page_007.xhtml");
        assert_eq!(page_file_name(1, 2, "html", true), "page_001_002.html");
        assert_eq!(page_file_name(1234, 5, "xhtml", false), "page_1234.xhtml");
    }

    #[test]
    fn test_document_dir() {
        assert_eq!(
            document_dir(Path::new("/data/aapl-10k.xhtml"), None),
            PathBuf::from("/data/extracted_pages/aapl-10k")
        );
        assert_eq!(
            document_dir(Path::new("/data/aapl-10k.xhtml"), Some(Path::new("/out"))),
            PathBuf::from("/out/aapl-10k")
        );
    }
}
