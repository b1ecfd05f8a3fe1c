//! Request/response DTOs for the REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::DispatchMetrics;

/// Event submission body.
///
/// The payload is treated as an open mapping; only the `msg` key is
/// required, and extra keys are ignored. The handler extracts the field
/// from raw JSON so a missing key maps to the documented 400, not a
/// deserialization rejection.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EventRequest {
    /// The event payload to relay.
    pub msg: String,
}

/// Acknowledgement returned before the queue send is confirmed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventResponse {
    /// `Message received: <msg>`
    pub status: String,
}

/// Health check response with backend connectivity and dispatcher
/// counters.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` when both backends are connected, `degraded` otherwise.
    pub status: String,
    /// Whether the queue client connection is established.
    pub queue_connected: bool,
    /// Whether the store connection is established.
    pub store_connected: bool,
    /// Fire-and-forget dispatcher counters.
    pub dispatch: DispatchMetrics,
    /// Crate version.
    pub version: String,
    /// RFC 3339 timestamp of this probe.
    pub timestamp: String,
}
