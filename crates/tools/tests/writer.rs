use pager::paginate;
use std::fs;
use tools::{PageWriter, page_file_name};

const FILING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="en"><head><title>T</title></head><body><div id="pf1" class="pf">one</div><div id="pf2" class="pf">two</div></body></html>"#;

#[test]
fn test_writes_pages_and_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("filing");
    let pagination = paginate(FILING).unwrap();

    let writer = PageWriter::create(&out, "xhtml").unwrap();
    let pages = pagination.page_documents().unwrap();
    let written = writer
        .write_pages(&pages, pagination.manifest.has_duplicate_numbers())
        .unwrap();
    writer.write_manifest(&pagination.manifest).unwrap();

    assert_eq!(written.len(), 2);
    assert!(out.join("page_001.xhtml").exists());
    let second = fs::read_to_string(out.join("page_002.xhtml")).unwrap();
    assert!(second.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n"));
    assert!(second.contains("xml:lang=\"en\""));
    assert!(second.contains("two"));
    assert!(!second.contains("one"));

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["document_info"]["total_pages"], 2);
}

#[test]
fn test_duplicate_numbers_use_sequence_names() {
    let dir = tempfile::tempdir().unwrap();
    let pagination = paginate(
        r#"<html><body><div id="pf1" class="pf">a</div><div id="pf1" class="pf">b</div></body></html>"#,
    )
    .unwrap();
    assert!(pagination.manifest.has_duplicate_numbers());

    let writer = PageWriter::create(dir.path(), "html").unwrap();
    let pages = pagination.page_documents().unwrap();
    writer.write_pages(&pages, true).unwrap();

    assert!(dir.path().join(page_file_name(1, 1, "html", true)).exists());
    assert!(dir.path().join("page_001_002.html").exists());
    assert!(!dir.path().join("page_001.html").exists());
}

#[test]
fn test_unnumbered_cover_does_not_overwrite_numbered_page() {
    let dir = tempfile::tempdir().unwrap();
    let pagination = paginate(
        r#"<html><head><style>.pf { width: 800px; height: 1000px }</style></head><body><div class="pf">cover</div><div id="pf1" class="pf">one</div></body></html>"#,
    )
    .unwrap();
    assert!(pagination.manifest.has_duplicate_numbers());

    let writer = PageWriter::create(dir.path(), "xhtml").unwrap();
    let pages = pagination.page_documents().unwrap();
    let written = writer
        .write_pages(&pages, pagination.manifest.has_duplicate_numbers())
        .unwrap();

    assert_eq!(written.len(), 2);
    let cover = fs::read_to_string(dir.path().join("page_001_001.xhtml")).unwrap();
    let first = fs::read_to_string(dir.path().join("page_001_002.xhtml")).unwrap();
    assert!(cover.contains("cover"));
    assert!(first.contains("one"));
}
