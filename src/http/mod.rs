//! HTTP protocol implementation.
//!
//! This module serves HTTP/1.0 and HTTP/1.1 GET and HEAD requests, one
//! request per call, with keep-alive left to the scheduler.
//!
//! # Architecture
//!
//! - **`connection`**: the connection type and the request state machine
//! - **`parser`**: request line and header line parsing
//! - **`request`**: method, version and request representation
//! - **`response`**: status codes, lazy bodies and the response builder
//! - **`writer`**: serializes and writes responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Request State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │ Read request line│ ── timeout ──► 408, Closed
//!        └──────┬───────────┘ ── malformed ► 400, Closed
//!               ▼
//!        ┌──────────────────┐
//!        │   Skip headers   │ ── timeout ──► 408, Closed
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │  Check version   │ ── not 1.0/1.1 ► 501, Closed
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │ Resolve + write  │
//!        └──────┬───────────┘
//!               ├─ HTTP/1.1 → ReuseEligible (handed back to the scheduler)
//!               └─ HTTP/1.0 → Closed
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
