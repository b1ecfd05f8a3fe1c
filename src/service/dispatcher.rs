//! Bounded fire-and-forget dispatcher for queue side effects.
//!
//! Ingress sends and post-persist deletes are never awaited by their
//! originators. Rather than spawning one task per operation (unbounded
//! under a traffic burst), jobs flow through a fixed-capacity channel
//! into a small worker pool that owns the queue handle. When the buffer
//! is full the job is dropped, logged, and counted — callers never
//! block and never observe the outcome.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::queue::EventQueue;

/// A queued side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Enqueue an event body.
    Send(String),
    /// Acknowledge a delivery by ack token.
    Delete(String),
}

/// Point-in-time dispatcher counters, surfaced via `/health`.
#[derive(Debug, Clone, Copy, serde::Serialize, utoipa::ToSchema)]
pub struct DispatchMetrics {
    /// Jobs currently buffered or executing.
    pub depth: usize,
    /// Jobs dropped because the buffer was full.
    pub dropped: u64,
}

/// Handle for dispatching jobs into the worker pool.
///
/// Cloneable; all clones share the buffer and counters.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<Job>,
    depth: Arc<AtomicUsize>,
    dropped: Arc<AtomicU64>,
}

impl Dispatcher {
    /// Starts `workers` worker tasks draining a buffer of `capacity`
    /// jobs into `queue`. Workers run for the process lifetime.
    #[must_use]
    pub fn spawn(queue: Arc<dyn EventQueue>, capacity: usize, workers: usize) -> Self {
        let (tx, rx) = mpsc::channel::<Job>(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let depth = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicU64::new(0));

        for worker in 0..workers.max(1) {
            let rx = Arc::clone(&rx);
            let queue = Arc::clone(&queue);
            let depth = Arc::clone(&depth);
            tokio::spawn(async move {
                info!(worker, "dispatch worker started");
                loop {
                    let job = {
                        let mut guard = rx.lock().await;
                        guard.recv().await
                    };
                    let Some(job) = job else {
                        // Channel closed: all dispatcher handles dropped.
                        return;
                    };
                    match job {
                        Job::Send(body) => queue.send(&body).await,
                        Job::Delete(token) => queue.delete(&token).await,
                    }
                    depth.fetch_sub(1, Ordering::SeqCst);
                }
            });
        }

        Self {
            tx,
            depth,
            dropped,
        }
    }

    /// Hands a job to the worker pool without waiting for it.
    ///
    /// Overflow policy: when the buffer is full the job is dropped, a
    /// warning is logged, and the drop counter increments. Returns
    /// whether the job was accepted.
    pub fn dispatch(&self, job: Job) -> bool {
        self.depth.fetch_add(1, Ordering::SeqCst);
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(e) => {
                self.depth.fetch_sub(1, Ordering::SeqCst);
                self.dropped.fetch_add(1, Ordering::SeqCst);
                warn!(job = ?e.into_inner(), "dispatch buffer full; job dropped");
                false
            }
        }
    }

    /// Current counter values.
    #[must_use]
    pub fn metrics(&self) -> DispatchMetrics {
        DispatchMetrics {
            depth: self.depth.load(Ordering::SeqCst),
            dropped: self.dropped.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Debug, Default)]
    struct RecordingQueue {
        sent: AsyncMutex<Vec<String>>,
        deleted: AsyncMutex<Vec<String>>,
    }

    #[async_trait]
    impl EventQueue for RecordingQueue {
        async fn send(&self, body: &str) {
            self.sent.lock().await.push(body.to_string());
        }

        async fn receive(&self) -> crate::queue::ReceiveOutcome {
            crate::queue::ReceiveOutcome::Empty
        }

        async fn delete(&self, ack_token: &str) {
            self.deleted.lock().await.push(ack_token.to_string());
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    /// Queue whose operations block until told to proceed, for filling
    /// the dispatch buffer deterministically.
    #[derive(Debug)]
    struct StalledQueue {
        gate: tokio::sync::Semaphore,
    }

    #[async_trait]
    impl EventQueue for StalledQueue {
        async fn send(&self, _body: &str) {
            let Ok(permit) = self.gate.acquire().await else {
                return;
            };
            drop(permit);
        }

        async fn receive(&self) -> crate::queue::ReceiveOutcome {
            crate::queue::ReceiveOutcome::Empty
        }

        async fn delete(&self, _ack_token: &str) {}

        fn is_connected(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn jobs_reach_the_queue() {
        let queue = Arc::new(RecordingQueue::default());
        let dispatcher = Dispatcher::spawn(Arc::clone(&queue) as Arc<dyn EventQueue>, 16, 2);

        assert!(dispatcher.dispatch(Job::Send("hello".to_string())));
        assert!(dispatcher.dispatch(Job::Delete("R1".to_string())));

        // Let the workers drain.
        for _ in 0..50 {
            if dispatcher.metrics().depth == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(queue.sent.lock().await.as_slice(), ["hello"]);
        assert_eq!(queue.deleted.lock().await.as_slice(), ["R1"]);
        assert_eq!(dispatcher.metrics().dropped, 0);
    }

    #[tokio::test]
    async fn overflow_drops_and_counts() {
        let queue = Arc::new(StalledQueue {
            gate: tokio::sync::Semaphore::new(0),
        });
        let dispatcher = Dispatcher::spawn(Arc::clone(&queue) as Arc<dyn EventQueue>, 1, 1);

        // First job occupies the worker, second fills the buffer; give
        // the worker a moment to pick the first one up.
        assert!(dispatcher.dispatch(Job::Send("a".to_string())));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(dispatcher.dispatch(Job::Send("b".to_string())));
        assert!(!dispatcher.dispatch(Job::Send("c".to_string())));

        let metrics = dispatcher.metrics();
        assert_eq!(metrics.dropped, 1);
        assert!(metrics.depth >= 2);

        queue.gate.add_permits(10);
    }

    #[tokio::test]
    async fn depth_tracks_buffered_jobs() {
        let queue = Arc::new(StalledQueue {
            gate: tokio::sync::Semaphore::new(0),
        });
        let dispatcher = Dispatcher::spawn(Arc::clone(&queue) as Arc<dyn EventQueue>, 8, 1);

        for i in 0..4 {
            assert!(dispatcher.dispatch(Job::Send(format!("m{i}"))));
        }
        assert_eq!(dispatcher.metrics().depth, 4);

        queue.gate.add_permits(10);
        for _ in 0..50 {
            if dispatcher.metrics().depth == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(dispatcher.metrics().depth, 0);
    }
}
