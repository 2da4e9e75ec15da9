//! Fixed-size worker pool.
//!
//! Every worker runs one `serve_once` at a time and reports back on the
//! completion channel. Workers never touch the monitor; a connection worth
//! keeping goes back to the scheduler inside a [`PendingRegistration`].

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::http::connection::{ConnId, Connection, HttpHandler, Outcome};

/// A connection handed back after a request, idle and eligible for reuse.
pub struct PendingRegistration {
    pub conn: Connection,
    pub handed_back_at: Instant,
}

/// What a worker reports after serving one request.
pub enum Completion {
    /// The connection has been closed by the worker.
    Done(ConnId),
    /// The connection should be monitored for the next request.
    Park(PendingRegistration),
}

struct Worker {
    id: usize,
    handle: JoinHandle<()>,
}

pub struct WorkerPool {
    jobs: mpsc::Sender<Connection>,
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Starts `size` workers sharing one job queue of `queue_depth` slots.
    ///
    /// # Panics
    ///
    /// Panics if `size` or `queue_depth` is zero.
    pub fn spawn(
        size: usize,
        queue_depth: usize,
        handler: Arc<HttpHandler>,
        completions: mpsc::UnboundedSender<Completion>,
    ) -> Self {
        assert!(size > 0, "worker pool needs at least one worker");
        assert!(queue_depth > 0, "job queue needs at least one slot");

        let (jobs, receiver) = mpsc::channel(queue_depth);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|id| Worker {
                id,
                handle: tokio::spawn(work(
                    id,
                    Arc::clone(&receiver),
                    Arc::clone(&handler),
                    completions.clone(),
                )),
            })
            .collect();

        Self { jobs, workers }
    }

    /// Queues a connection for its next request.
    ///
    /// Waits while the queue is full, which is what keeps a flood of new
    /// connections from growing memory without bound.
    pub async fn submit(&self, conn: Connection) -> anyhow::Result<()> {
        self.jobs
            .send(conn)
            .await
            .map_err(|_| anyhow::anyhow!("worker pool has shut down"))
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Stops every worker. Connections still queued are dropped, and with
    /// them closed.
    pub fn shutdown(&self) {
        for worker in &self.workers {
            trace!(worker = worker.id, "Stopping worker");
            worker.handle.abort();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn work(
    id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Connection>>>,
    handler: Arc<HttpHandler>,
    completions: mpsc::UnboundedSender<Completion>,
) {
    loop {
        let job = receiver.lock().await.recv().await;
        let Some(conn) = job else {
            debug!(worker = id, "Job queue closed, worker exiting");
            return;
        };

        let conn_id = conn.id();
        trace!(worker = id, conn = conn_id, "Serving connection");

        // Run the unit in its own task so a panic loses one connection,
        // not the worker.
        let unit = tokio::spawn(serve_unit(Arc::clone(&handler), conn));
        let completion = match unit.await {
            Ok(completion) => completion,
            Err(e) => {
                error!(worker = id, conn = conn_id, error = %e, "Request handling panicked");
                Completion::Done(conn_id)
            }
        };

        if completions.send(completion).is_err() {
            debug!(worker = id, "Scheduler gone, worker exiting");
            return;
        }
    }
}

/// Serves one request and turns the outcome into a completion. The
/// connection is closed here unless it is handed back.
pub async fn serve_unit(handler: Arc<HttpHandler>, mut conn: Connection) -> Completion {
    match handler.serve_once(&mut conn).await {
        Ok(Outcome::ReuseEligible) => Completion::Park(PendingRegistration {
            conn,
            handed_back_at: Instant::now(),
        }),
        Ok(Outcome::Closed) => {
            let id = conn.id();
            conn.close();
            Completion::Done(id)
        }
        Err(e) => {
            let id = conn.id();
            warn!(conn = id, peer = %conn.peer(), error = %e, "Error while handling request");
            conn.close();
            Completion::Done(id)
        }
    }
}
