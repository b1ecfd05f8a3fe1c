//! # event-relay
//!
//! HTTP-fronted event relay: clients POST events to the ingress API,
//! the service enqueues them on an at-least-once worker queue (AWS
//! SQS), and a background consumer drains the queue into a document
//! store (MongoDB). Producers never wait for queue confirmation — the
//! ingress acknowledgement is fire-and-forget by contract.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │        │
//!     │        └── Dispatcher (service/) ── bounded fire-and-forget pool
//!     │                 │
//!     ├── SqsQueue (queue/) ◄── send / receive / delete
//!     │                 ▲
//!     ├── Consumer Loop (service/) ── receive → insert → ack
//!     │                 │
//!     └── MongoSink (persistence/)
//! ```
//!
//! Delivery is at-least-once: a crash between persist and ack leads to
//! redelivery and a duplicate record, which storage accepts (no dedup
//! key). The offline `logs-tool` binary shares the persistence layer.

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod logs;
pub mod persistence;
pub mod queue;
pub mod service;
