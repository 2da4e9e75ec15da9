use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::responder::Responder;

/// Answers every request with its own target, as plain text.
#[derive(Debug, Default, Clone, Copy)]
pub struct Echo;

impl Responder for Echo {
    fn resolve(&self, path: &str) -> Response {
        ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "text/plain")
            .bytes(format!("{}\n", path))
            .build()
    }
}
