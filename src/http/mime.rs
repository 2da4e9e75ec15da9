//! MIME type detection based on file extensions.

use std::path::Path;

/// Returns the `Content-Type` for a file, falling back to
/// `application/octet-stream` for anything unknown.
///
/// # Example
///
/// ```
/// # use parkway::http::mime;
/// # use std::path::Path;
/// assert_eq!(mime::from_path(Path::new("www/index.html")), "text/html");
/// assert_eq!(mime::from_path(Path::new("archive.bin")), "application/octet-stream");
/// ```
pub fn from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
