//! Persistence layer: append-only document sink for relayed events.
//!
//! [`EventSink`] is the seam between the consumer loop and the concrete
//! store. The production implementation is [`mongo::MongoSink`]; tests
//! substitute in-memory fakes. Insert failures never propagate — they
//! are logged and the records are dropped, by contract.

pub mod models;
pub mod mongo;

use async_trait::async_trait;

pub use models::{LogRecord, PersistedRecord};
pub use mongo::MongoSink;

/// Append-only record sink.
#[async_trait]
pub trait EventSink: Send + Sync + std::fmt::Debug {
    /// Appends records to the configured collection. Failures are
    /// absorbed and logged; callers never observe them.
    async fn insert(&self, records: Vec<PersistedRecord>);

    /// Whether the store connection is currently established.
    fn is_connected(&self) -> bool;
}
