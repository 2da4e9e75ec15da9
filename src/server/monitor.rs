//! Readiness monitoring for parked keep-alive connections.
//!
//! A `Monitor` is owned by the scheduler task and by nothing else. Workers
//! hand connections back through the completion channel; only the owner
//! registers, cancels, evicts or waits.

use std::collections::{HashMap, VecDeque};
use std::future::poll_fn;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::http::connection::{ConnId, Connection};
use crate::server::pool::PendingRegistration;

struct Parked {
    conn: Connection,
    parked_at: Instant,
}

/// Whether a handed-back connection made it into the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Registered,
    /// Already past its keep-alive deadline; closed instead.
    Expired,
}

#[derive(Default)]
pub struct Monitor {
    parked: HashMap<ConnId, Parked>,
    // Registered with bytes already buffered; ready without touching the socket.
    ready: VecDeque<ConnId>,
}

fn expired(since: Instant, now: Instant, keep_alive: Duration) -> bool {
    now.saturating_duration_since(since) >= keep_alive
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parked.is_empty()
    }

    pub fn contains(&self, id: ConnId) -> bool {
        self.parked.contains_key(&id)
    }

    /// Starts watching `conn` for its next request.
    pub fn register(&mut self, conn: Connection, parked_at: Instant) {
        let id = conn.id();
        if conn.has_buffered() {
            self.ready.push_back(id);
        }
        self.parked.insert(id, Parked { conn, parked_at });
    }

    /// Stops watching `id` and returns the connection to the caller.
    pub fn cancel(&mut self, id: ConnId) -> Option<Connection> {
        self.parked.remove(&id).map(|p| p.conn)
    }

    /// Registers a handed-back connection, or closes it if its keep-alive
    /// deadline passed while it was on its way back.
    pub fn admit(
        &mut self,
        pending: PendingRegistration,
        now: Instant,
        keep_alive: Duration,
    ) -> Admission {
        if expired(pending.handed_back_at, now, keep_alive) {
            debug!(conn = pending.conn.id(), "Handed back after its deadline, closing");
            pending.conn.close();
            return Admission::Expired;
        }

        self.register(pending.conn, pending.handed_back_at);
        Admission::Registered
    }

    /// Unregisters and closes every connection idle for `keep_alive` or
    /// longer. Returns how many were closed.
    pub fn evict_expired(&mut self, now: Instant, keep_alive: Duration) -> usize {
        let stale: Vec<ConnId> = self
            .parked
            .iter()
            .filter(|(_, p)| expired(p.parked_at, now, keep_alive))
            .map(|(id, _)| *id)
            .collect();

        for id in &stale {
            if let Some(parked) = self.parked.remove(id) {
                debug!(conn = id, peer = %parked.conn.peer(), "Closing idle keep-alive connection");
                parked.conn.close();
            }
        }

        stale.len()
    }

    pub fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<ConnId> {
        while let Some(id) = self.ready.pop_front() {
            if self.parked.contains_key(&id) {
                return Poll::Ready(id);
            }
        }

        for (id, parked) in &self.parked {
            if parked.conn.poll_peek_ready(cx).is_ready() {
                return Poll::Ready(*id);
            }
        }

        Poll::Pending
    }

    /// Resolves with a parked connection that has something to read. The
    /// connection stays registered until it is cancelled.
    ///
    /// Pending forever while nothing is parked. Cancel safe.
    pub async fn ready(&mut self) -> ConnId {
        poll_fn(|cx| self.poll_ready(cx)).await
    }
}
