//! Parkway - a small HTTP/1.0 and 1.1 file server
//!
//! Requests are served by a fixed pool of workers. Keep-alive connections
//! wait for their next request in the scheduler, not in a worker.

pub mod config;
pub mod http;
pub mod responder;
pub mod server;
