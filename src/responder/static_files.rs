//! Serves files from a directory on disk.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::http::mime;
use crate::http::response::{Body, Response, ResponseBuilder, StatusCode};
use crate::responder::Responder;

const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

enum Lookup {
    File(PathBuf),
    Forbidden,
    Missing,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a request target onto a path under the root.
    ///
    /// Query strings are ignored, `..` is refused and dot files stay hidden.
    fn lookup(&self, target: &str) -> Lookup {
        let path = target.split(['?', '#']).next().unwrap_or_default();
        let relative = Path::new(path.trim_start_matches('/'));

        let mut full = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    if part.to_string_lossy().starts_with('.') {
                        return Lookup::Missing;
                    }
                    full.push(part);
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Lookup::Forbidden;
                }
            }
        }

        if full.is_dir() {
            full.push(INDEX_FILE);
        }

        if full.is_file() {
            Lookup::File(full)
        } else {
            Lookup::Missing
        }
    }
}

impl Responder for StaticFiles {
    fn resolve(&self, path: &str) -> Response {
        let file = match self.lookup(path) {
            Lookup::File(file) => file,
            Lookup::Forbidden => {
                debug!(path, "Refusing path outside the served root");
                return Response::forbidden();
            }
            Lookup::Missing => return Response::not_found(),
        };

        let len = match std::fs::metadata(&file) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path, "File vanished before it could be served");
                return Response::not_found();
            }
            Err(e) => {
                warn!(path, error = %e, "Could not read file metadata");
                return Response::internal_error();
            }
        };

        ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", mime::from_path(&file))
            .header("Content-Length", len.to_string())
            .body(Body::File { path: file, len })
            .build()
    }
}
