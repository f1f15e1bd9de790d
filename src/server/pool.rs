//! Connection worker pool.
//!
//! A fixed set of worker coroutines is spawned once at server start; all of
//! them share one receiver, so accepted connections load-balance across
//! whichever worker is free. The pool drains on shutdown: dropping the
//! sender closes the channel and the workers exit after finishing their
//! current connection.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use may::net::TcpStream;
use may::sync::mpsc;
use tracing::{debug, error, info};

use super::conn;
use super::core::ServerShared;

/// Counters exposed for monitoring the pool.
#[derive(Debug, Default)]
pub struct PoolMetrics {
    dispatched: AtomicU64,
    completed: AtomicU64,
}

impl PoolMetrics {
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Connections handed to the pool but not yet finished.
    pub fn in_flight(&self) -> u64 {
        self.dispatched().saturating_sub(self.completed())
    }
}

pub(crate) struct ConnPool {
    sender: mpsc::Sender<TcpStream>,
    metrics: Arc<PoolMetrics>,
}

impl ConnPool {
    /// Spawn the worker coroutines.
    ///
    /// # Safety
    ///
    /// Spawning `may` coroutines is unsafe in the runtime's own terms; the
    /// caller must ensure the `may` runtime is usable in this process.
    pub(crate) unsafe fn new(shared: Arc<ServerShared>) -> Self {
        let (sender, receiver) = mpsc::channel::<TcpStream>();
        let receiver = Arc::new(receiver);
        let metrics = Arc::new(PoolMetrics::default());

        info!(
            workers = shared.config.workers,
            stack_size = shared.config.stack_size,
            "starting connection workers"
        );

        for worker_id in 0..shared.config.workers {
            let receiver = Arc::clone(&receiver);
            let shared = Arc::clone(&shared);
            let metrics = Arc::clone(&metrics);

            let spawned = may::coroutine::Builder::new()
                .stack_size(shared.config.stack_size)
                .spawn(move || {
                    debug!(worker_id, "connection worker started");
                    while let Ok(stream) = receiver.recv() {
                        conn::handle_connection(stream, &shared);
                        metrics.completed.fetch_add(1, Ordering::Relaxed);
                    }
                    debug!(worker_id, "connection worker exiting");
                });

            if let Err(err) = spawned {
                error!(worker_id, error = %err, "failed to spawn connection worker");
            }
        }

        Self { sender, metrics }
    }

    /// Hand an accepted connection to the workers.
    pub(crate) fn dispatch(&self, stream: TcpStream) -> io::Result<()> {
        self.metrics.dispatched.fetch_add(1, Ordering::Relaxed);
        self.sender.send(stream).map_err(|err| {
            error!(error = %err, "connection worker pool disconnected");
            io::Error::new(io::ErrorKind::BrokenPipe, "worker pool disconnected")
        })
    }

    pub(crate) fn metrics(&self) -> Arc<PoolMetrics> {
        Arc::clone(&self.metrics)
    }
}
