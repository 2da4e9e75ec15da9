//! Responders turn a request target into a response.
//!
//! The state machine calls exactly one method on a responder and never
//! expects it to fail: a missing resource is a 404 response, not an error.
//! Responders are shared by every worker, so they hold no mutable state.
//! They run on the blocking thread pool and may do synchronous file I/O.

pub mod echo;
pub mod static_files;

pub use echo::Echo;
pub use static_files::StaticFiles;

use crate::http::response::Response;

pub trait Responder: Send + Sync {
    fn resolve(&self, path: &str) -> Response;
}
