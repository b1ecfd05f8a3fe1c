//! Document models for the event collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The durable representation of a relayed event.
///
/// Append-only: no uniqueness constraint and no dedup key, so a
/// redelivered queue message produces a second identical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    /// The event payload as received from the queue.
    pub msg: String,
}

impl PersistedRecord {
    /// Wraps a queue message body as a record.
    #[must_use]
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// A structured log line, produced by the offline logs tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Timestamp parsed from the log line.
    pub datetime: DateTime<Utc>,
    /// Emitting service name.
    pub service: String,
    /// Log level string (e.g. `INFO`).
    pub severity: String,
    /// Message text, with any embedded field separators preserved.
    pub message: String,
}
