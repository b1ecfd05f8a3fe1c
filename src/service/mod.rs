//! Service layer: the bounded fire-and-forget dispatcher and the
//! background consumer loop.

pub mod consumer;
pub mod dispatcher;

pub use consumer::spawn_consumer;
pub use dispatcher::{DispatchMetrics, Dispatcher, Job};
