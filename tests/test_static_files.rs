use std::path::Path;

use parkway::http::mime;
use parkway::http::response::{Body, StatusCode};
use parkway::responder::{Echo, Responder, StaticFiles};

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), b"<h1>home</h1>").unwrap();
    std::fs::write(dir.path().join("data.bin"), [0u8, 1, 2, 3]).unwrap();
    std::fs::write(dir.path().join(".secret"), b"hidden").unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs").join("index.html"), b"docs").unwrap();
    dir
}

#[test]
fn test_serves_existing_file() {
    let dir = site();
    let files = StaticFiles::new(dir.path());

    let response = files.resolve("/index.html");
    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.header("Content-Type"), Some("text/html"));
    assert_eq!(response.header("Content-Length"), Some("13"));
    assert_eq!(
        response.body,
        Body::File {
            path: dir.path().join("index.html"),
            len: 13
        }
    );
}

#[test]
fn test_content_length_is_not_duplicated() {
    let dir = site();
    let response = StaticFiles::new(dir.path()).resolve("/data.bin");

    let lengths = response
        .headers
        .iter()
        .filter(|(k, _)| k == "Content-Length")
        .count();
    assert_eq!(lengths, 1);
    assert_eq!(response.header("Content-Type"), Some("application/octet-stream"));
}

#[test]
fn test_directory_serves_index() {
    let dir = site();
    let files = StaticFiles::new(dir.path());

    assert_eq!(files.resolve("/").header("Content-Length"), Some("13"));
    assert_eq!(files.resolve("/docs/").header("Content-Length"), Some("4"));
    assert_eq!(files.resolve("/docs").status, StatusCode::Ok);
}

#[test]
fn test_missing_file_is_404() {
    let dir = site();
    let response = StaticFiles::new(dir.path()).resolve("/missing");

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.header("Content-Length"), Some("0"));
    assert!(response.body.is_empty());
}

#[test]
fn test_hidden_file_is_404() {
    let dir = site();
    let response = StaticFiles::new(dir.path()).resolve("/.secret");
    assert_eq!(response.status, StatusCode::NotFound);
}

#[test]
fn test_parent_directory_is_forbidden() {
    let dir = site();
    let files = StaticFiles::new(dir.path().join("docs"));

    assert_eq!(files.resolve("/../index.html").status, StatusCode::Forbidden);
    assert_eq!(files.resolve("/a/../../index.html").status, StatusCode::Forbidden);
}

#[test]
fn test_query_string_is_ignored() {
    let dir = site();
    let response = StaticFiles::new(dir.path()).resolve("/index.html?v=2#top");
    assert_eq!(response.status, StatusCode::Ok);
}

#[test]
fn test_leading_slashes_are_stripped() {
    let dir = site();
    let response = StaticFiles::new(dir.path()).resolve("//index.html");
    assert_eq!(response.status, StatusCode::Ok);
}

#[test]
fn test_echo_returns_target() {
    let response = Echo.resolve("/anything?x=1");

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert_eq!(response.body.len(), "/anything?x=1\n".len() as u64);
}

#[test]
fn test_mime_types() {
    assert_eq!(mime::from_path(Path::new("a.HTML")), "text/html");
    assert_eq!(mime::from_path(Path::new("a.css")), "text/css");
    assert_eq!(mime::from_path(Path::new("a.png")), "image/png");
    assert_eq!(mime::from_path(Path::new("README")), "application/octet-stream");
}
