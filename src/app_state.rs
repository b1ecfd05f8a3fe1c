//! Shared application state injected into all Axum handlers.
//!
//! Clients are constructed once at startup and passed in explicitly;
//! there is no global mutable state.

use std::sync::Arc;

use crate::persistence::EventSink;
use crate::queue::EventQueue;
use crate::service::Dispatcher;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Queue client, also polled by the consumer loop.
    pub queue: Arc<dyn EventQueue>,
    /// Persistence sink fed by the consumer loop.
    pub store: Arc<dyn EventSink>,
    /// Bounded fire-and-forget dispatcher for queue side effects.
    pub dispatcher: Dispatcher,
}
