//! The connection scheduler.
//!
//! One task owns the listener and the [`Monitor`]. Each turn of its loop it
//!
//! 1. drains worker completions and parks keep-alive connections,
//! 2. evicts parked connections idle past the keep-alive deadline (at most
//!    once per sweep interval),
//! 3. waits, for at most the poll interval, for a new connection, a ready
//!    parked connection or a completion,
//! 4. dispatches what it got to the worker pool.
//!
//! Idle keep-alive time is spent here rather than in a worker, so the pool
//! size only limits requests in flight, not open connections.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::config::{Config, TimeoutConfig};
use crate::http::connection::{ConnId, Connection, HttpHandler, Timeouts};
use crate::responder::Responder;
use crate::server::monitor::{Admission, Monitor};
use crate::server::pool::{Completion, WorkerPool};

enum Event {
    Accepted(TcpStream, SocketAddr),
    AcceptFailed(io::Error),
    Ready(ConnId),
    Completed(Completion),
    Idle,
}

pub struct Scheduler {
    listener: TcpListener,
    monitor: Monitor,
    pool: WorkerPool,
    completions: mpsc::UnboundedReceiver<Completion>,
    timeouts: TimeoutConfig,
    next_id: ConnId,
    last_sweep: Instant,
}

impl Scheduler {
    /// Binds `server.listen_addr` and starts the worker pool.
    pub async fn bind(config: &Config, responder: Arc<dyn Responder>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(&config.server.listen_addr)
            .await
            .with_context(|| format!("binding {}", config.server.listen_addr))?;

        Ok(Self::from_listener(listener, config, responder))
    }

    /// Uses an already bound listener; `server.listen_addr` is ignored.
    pub fn from_listener(
        listener: TcpListener,
        config: &Config,
        responder: Arc<dyn Responder>,
    ) -> Self {
        let (tx, completions) = mpsc::unbounded_channel();
        let handler = Arc::new(HttpHandler::new(
            responder,
            Timeouts::from(&config.timeouts),
        ));
        let pool = WorkerPool::spawn(
            config.server.workers,
            config.server.queue_depth,
            handler,
            tx,
        );

        Self {
            listener,
            monitor: Monitor::new(),
            pool,
            completions,
            timeouts: config.timeouts.clone(),
            next_id: 1,
            last_sweep: Instant::now(),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs until the worker pool goes away, which only happens on
    /// shutdown.
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!(
            addr = %self.local_addr()?,
            workers = self.pool.size(),
            keep_alive_ms = self.timeouts.keep_alive_ms,
            "Listening"
        );

        loop {
            self.turn().await?;
        }
    }

    async fn turn(&mut self) -> anyhow::Result<()> {
        self.drain_completions();
        self.sweep(Instant::now());

        match self.wait().await {
            Event::Accepted(stream, peer) => {
                let id = self.next_id;
                self.next_id += 1;
                debug!(conn = id, peer = %peer, "Accepted connection");
                self.pool.submit(Connection::new(id, stream, peer)).await?;
            }
            Event::AcceptFailed(e) => {
                warn!(error = %e, "Failed to accept connection");
                tokio::time::sleep(self.timeouts.poll_interval()).await;
            }
            Event::Ready(id) => {
                if let Some(conn) = self.monitor.cancel(id) {
                    trace!(conn = id, "Reusing connection");
                    self.pool.submit(conn).await?;
                }
            }
            Event::Completed(completion) => self.complete(completion, Instant::now()),
            Event::Idle => {}
        }

        Ok(())
    }

    async fn wait(&mut self) -> Event {
        tokio::select! {
            res = self.listener.accept() => match res {
                Ok((stream, peer)) => Event::Accepted(stream, peer),
                Err(e) => Event::AcceptFailed(e),
            },
            id = self.monitor.ready() => Event::Ready(id),
            Some(completion) = self.completions.recv() => Event::Completed(completion),
            _ = tokio::time::sleep(self.timeouts.poll_interval()) => Event::Idle,
        }
    }

    fn drain_completions(&mut self) {
        let now = Instant::now();
        while let Ok(completion) = self.completions.try_recv() {
            self.complete(completion, now);
        }
    }

    fn complete(&mut self, completion: Completion, now: Instant) {
        match completion {
            Completion::Done(id) => trace!(conn = id, "Connection finished"),
            Completion::Park(pending) => {
                let id = pending.conn.id();
                match self.monitor.admit(pending, now, self.timeouts.keep_alive()) {
                    Admission::Registered => trace!(conn = id, "Parked keep-alive connection"),
                    Admission::Expired => {}
                }
            }
        }
    }

    fn sweep(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_sweep) < self.timeouts.sweep_interval() {
            return;
        }
        self.last_sweep = now;

        let evicted = self.monitor.evict_expired(now, self.timeouts.keep_alive());
        if evicted > 0 {
            debug!(evicted, parked = self.monitor.len(), "Cleaned up keep-alive connections");
        }
    }
}
