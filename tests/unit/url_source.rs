//! Unit tests for URL list loading

use fetch_bench::urls::{load_urls, UrlSourceError};
use std::io::Write;
use tempfile::NamedTempFile;

fn list(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_preserves_file_order() {
    let file = list("https://c.example\nhttps://a.example\nhttps://b.example\n");
    let urls = load_urls(file.path(), 10).unwrap();
    assert_eq!(urls, ["https://c.example", "https://a.example", "https://b.example"]);
}

#[test]
fn test_handles_crlf_and_padding() {
    let file = list("  https://a.example  \r\n\r\n\thttps://b.example\r\n");
    let urls = load_urls(file.path(), 10).unwrap();
    assert_eq!(urls, ["https://a.example", "https://b.example"]);
}

#[test]
fn test_limit_truncates() {
    let contents: String = (0..50).map(|i| format!("https://{i}.example\n")).collect();
    let file = list(&contents);

    let urls = load_urls(file.path(), 7).unwrap();
    assert_eq!(urls.len(), 7);
    assert_eq!(urls[6], "https://6.example");
}

#[test]
fn test_empty_and_blank_only_files() {
    assert!(load_urls(list("").path(), 10).unwrap().is_empty());
    assert!(load_urls(list("\n  \n\t\n").path(), 10).unwrap().is_empty());
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("urls.txt");

    let err = load_urls(&missing, 10).unwrap_err();
    assert!(matches!(err, UrlSourceError::ResourceNotFound(ref p) if *p == missing));
    assert!(err.to_string().contains("urls.txt"));
}
