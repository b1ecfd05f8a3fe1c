//! Background consumer: drains the queue into the persistence sink.
//!
//! One long-lived task per process. Each iteration pulls at most one
//! message, persists it, then hands the acknowledgement to the
//! dispatcher without waiting for it. The delete is unconditional on an
//! *attempted* persist, not on its success — insert failures are
//! swallowed inside the sink, so a failed write still acks and the
//! message is lost to storage. At-least-once delivery means a crash
//! between persist and ack instead produces a duplicate record.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::dispatcher::{Dispatcher, Job};
use crate::persistence::{EventSink, PersistedRecord};
use crate::queue::{EventQueue, ReceiveOutcome};

/// Runs one receive/persist/ack iteration.
///
/// Returns whether a message was processed, which the loop ignores but
/// tests observe.
pub async fn run_iteration(
    queue: &dyn EventQueue,
    sink: &dyn EventSink,
    dispatcher: &Dispatcher,
) -> bool {
    match queue.receive().await {
        ReceiveOutcome::Message(message) => {
            debug!(body = %message.body, "message received");
            sink.insert(vec![PersistedRecord::new(message.body)]).await;
            dispatcher.dispatch(Job::Delete(message.ack_token));
            true
        }
        ReceiveOutcome::Empty => false,
        // The failure was already logged at the client; the long-poll
        // window inside receive() is the only pacing, so a persistently
        // failing backend loops hot here.
        ReceiveOutcome::Failed(_) => false,
    }
}

/// Spawns the consumer loop for the process lifetime. There is no
/// shutdown hook; the task ends with the process.
pub fn spawn_consumer(
    queue: Arc<dyn EventQueue>,
    sink: Arc<dyn EventSink>,
    dispatcher: Dispatcher,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("consumer loop started");
        loop {
            run_iteration(queue.as_ref(), sink.as_ref(), &dispatcher).await;
        }
    })
}
