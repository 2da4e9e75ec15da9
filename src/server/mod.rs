//! Connection scheduling.
//!
//! - **`scheduler`**: the single task that owns the listener and the monitor
//! - **`monitor`**: readiness monitoring and idle eviction of parked connections
//! - **`pool`**: the fixed-size worker pool and its completion messages
//! - **`listener`**: process entry point wiring config, responder and scheduler
//!
//! # Connection lifecycle
//!
//! ```text
//!   accept ──► pool ──► serve_once ──► Closed ──► close
//!                ▲           │
//!                │           └─ ReuseEligible ──► completion channel
//!                │                                     │
//!          readable ◄── monitor (parked) ◄─────────────┘
//!                           │
//!                           └─ idle past keep-alive ──► close
//! ```
//!
//! A connection is held by exactly one of the scheduler or a single worker
//! at any time; every handoff is one message.

pub mod listener;
pub mod monitor;
pub mod pool;
pub mod scheduler;

pub use monitor::{Admission, Monitor};
pub use pool::{Completion, PendingRegistration, WorkerPool};
pub use scheduler::Scheduler;
