//! Queue client abstraction: at-least-once delivery with long-poll
//! receive and explicit per-message acknowledgement.
//!
//! [`EventQueue`] is the seam between the HTTP ingress / consumer loop
//! and the concrete backend. The production implementation is
//! [`sqs::SqsQueue`]; tests substitute in-memory fakes.

pub mod sqs;

use async_trait::async_trait;

pub use sqs::SqsQueue;

/// A single delivery pulled from the queue.
///
/// The ack token identifies this specific delivery and is only valid
/// until the message is deleted or its visibility window expires, after
/// which the backend may redeliver the same body under a new token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    /// Opaque event payload as submitted by the producer.
    pub body: String,
    /// Receipt handle required to delete (acknowledge) this delivery.
    pub ack_token: String,
}

/// Failure classes for queue operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    /// The backend client was never established; the operation made no
    /// network call.
    #[error("queue client not initialized")]
    NotInitialized,

    /// The backend rejected or failed the call.
    #[error("queue backend error: {0}")]
    Backend(String),
}

/// Result of a single long-poll receive.
///
/// An empty poll and a failed poll are distinct outcomes; callers that
/// treat them the same still see exactly which one occurred in the logs.
#[derive(Debug, Clone)]
pub enum ReceiveOutcome {
    /// One message was delivered.
    Message(QueuedMessage),
    /// The wait window elapsed with nothing available.
    Empty,
    /// The receive call itself failed.
    Failed(QueueError),
}

/// At-least-once queue operations used by the ingress API and the
/// consumer loop.
///
/// `send` and `delete` are deliberately infallible at the signature
/// level: failures are logged inside the implementation and never
/// surfaced, preserving the fire-and-forget contract.
#[async_trait]
pub trait EventQueue: Send + Sync + std::fmt::Debug {
    /// Best-effort enqueue of an event body.
    async fn send(&self, body: &str);

    /// Long-polls for at most one message.
    async fn receive(&self) -> ReceiveOutcome;

    /// Best-effort acknowledgement of a delivery by its ack token.
    async fn delete(&self, ack_token: &str);

    /// Whether the backend connection is currently established.
    fn is_connected(&self) -> bool;
}
