//! AWS SQS implementation of the queue client.
//!
//! The client slot starts empty and is filled by [`SqsQueue::connect`],
//! which probes connectivity with `list_queues` before committing the
//! handle. While the slot is empty every operation logs
//! `queue client not initialized` and performs no network call.
//! [`SqsQueue::spawn_reconnect`] retries the probe with exponential
//! backoff until it succeeds, so a backend that was down at startup is
//! picked up without a process restart.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::Client as SqsClient;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::{EventQueue, QueueError, QueuedMessage, ReceiveOutcome};

/// Initial delay between reconnect attempts.
const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Ceiling for the reconnect backoff.
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Connection settings for the SQS client.
#[derive(Debug, Clone, Default)]
pub struct SqsConfig {
    /// AWS region. Falls back to the default provider chain when unset.
    pub region: Option<String>,
    /// Custom endpoint URL (LocalStack or similar).
    pub endpoint_url: Option<String>,
    /// URL of the worker queue.
    pub queue_url: Option<String>,
    /// Long-poll wait window in seconds.
    pub wait_time_secs: i32,
}

/// SQS-backed [`EventQueue`].
///
/// The inner client is established lazily and shared; `aws_sdk_sqs`
/// clients are cheap to clone and safe to use from many tasks, so no
/// additional serialization is needed around individual calls.
#[derive(Debug)]
pub struct SqsQueue {
    config: SqsConfig,
    client: RwLock<Option<SqsClient>>,
    connected: AtomicBool,
}

impl SqsQueue {
    /// Creates an unconnected queue client. Call [`Self::connect`] (or
    /// [`Self::spawn_reconnect`]) before expecting operations to reach
    /// the backend.
    #[must_use]
    pub fn new(config: SqsConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            connected: AtomicBool::new(false),
        }
    }

    /// Attempts to establish the backend connection.
    ///
    /// Builds the SDK client from the configured region/endpoint (the
    /// provider chain supplies credentials) and probes it with
    /// `list_queues`. On any failure the error is logged and the client
    /// slot is left unset; the caller is never handed an error.
    /// Returns whether the connection is now established.
    pub async fn connect(&self) -> bool {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &self.config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let shared = loader.load().await;
        let client = SqsClient::new(&shared);

        match client.list_queues().send().await {
            Ok(_) => {
                info!("connected to SQS");
                *self.client.write().await = Some(client);
                self.connected.store(true, Ordering::SeqCst);
                true
            }
            Err(e) => {
                error!(error = %e, "failed to connect to SQS");
                self.connected.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Spawns a background task that retries [`Self::connect`] with
    /// exponential backoff until the probe succeeds.
    pub fn spawn_reconnect(self: &Arc<Self>) {
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            let mut delay = RECONNECT_BASE_DELAY;
            loop {
                if queue.connect().await {
                    return;
                }
                warn!(delay_secs = delay.as_secs(), "retrying SQS connection");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(RECONNECT_MAX_DELAY);
            }
        });
    }

    /// Records the outcome of a backend call so `/health` reflects
    /// live connectivity, not just the startup probe.
    fn mark(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Returns the queue URL, logging when it was never configured.
    fn queue_url(&self) -> Option<&str> {
        let url = self.config.queue_url.as_deref();
        if url.is_none() {
            error!("WORKER_QUEUE_URL not configured; queue operation dropped");
        }
        url
    }
}

#[async_trait]
impl EventQueue for SqsQueue {
    async fn send(&self, body: &str) {
        let guard = self.client.read().await;
        let Some(client) = guard.as_ref() else {
            error!("queue client not initialized; send dropped");
            return;
        };
        let Some(queue_url) = self.queue_url() else {
            return;
        };

        match client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await
        {
            Ok(_) => {
                self.mark(true);
                info!(body, "message sent to queue");
            }
            Err(e) => {
                self.mark(false);
                error!(error = %e, "error sending message to queue");
            }
        }
    }

    async fn receive(&self) -> ReceiveOutcome {
        let guard = self.client.read().await;
        let Some(client) = guard.as_ref() else {
            error!("queue client not initialized; receive skipped");
            return ReceiveOutcome::Failed(QueueError::NotInitialized);
        };
        let Some(queue_url) = self.queue_url() else {
            return ReceiveOutcome::Failed(QueueError::Backend(
                "queue URL not configured".to_string(),
            ));
        };

        match client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(1)
            .wait_time_seconds(self.config.wait_time_secs)
            .send()
            .await
        {
            Ok(output) => {
                self.mark(true);
                let message = output.messages().iter().find_map(|m| {
                    let body = m.body()?.to_string();
                    let ack_token = m.receipt_handle()?.to_string();
                    Some(QueuedMessage { body, ack_token })
                });
                match message {
                    Some(message) => ReceiveOutcome::Message(message),
                    None => ReceiveOutcome::Empty,
                }
            }
            Err(e) => {
                self.mark(false);
                error!(error = %e, "error retrieving message from queue");
                ReceiveOutcome::Failed(QueueError::Backend(e.to_string()))
            }
        }
    }

    async fn delete(&self, ack_token: &str) {
        let guard = self.client.read().await;
        let Some(client) = guard.as_ref() else {
            error!("queue client not initialized; delete dropped");
            return;
        };
        let Some(queue_url) = self.queue_url() else {
            return;
        };

        match client
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(ack_token)
            .send()
            .await
        {
            Ok(_) => {
                self.mark(true);
                info!("message deleted from queue");
            }
            Err(e) => {
                self.mark(false);
                error!(error = %e, "error deleting message from queue");
            }
        }
    }

    /// Reflects the most recent probe or backend call, so a queue that
    /// went away after startup reads as disconnected. Individual calls
    /// are independent HTTP requests, so a later success flips it back.
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    impl SqsQueue {
        /// Installs a client directly, bypassing the probe.
        async fn install_client(&self, client: SqsClient) {
            *self.client.write().await = Some(client);
            self.connected.store(true, Ordering::SeqCst);
        }
    }

    /// A client whose endpoint refuses connections, so every call
    /// fails fast without leaving the host.
    fn refused_client() -> SqsClient {
        let config = aws_sdk_sqs::Config::builder()
            .behavior_version(aws_sdk_sqs::config::BehaviorVersion::latest())
            .region(aws_sdk_sqs::config::Region::new("us-east-1"))
            .credentials_provider(aws_sdk_sqs::config::Credentials::new(
                "akid", "secret", None, None, "test",
            ))
            .retry_config(aws_sdk_sqs::config::retry::RetryConfig::disabled())
            .endpoint_url("http://127.0.0.1:1")
            .build();
        SqsClient::from_conf(config)
    }

    fn unconnected() -> SqsQueue {
        SqsQueue::new(SqsConfig {
            queue_url: Some("http://localhost:4566/000000000000/worker".to_string()),
            wait_time_secs: 20,
            ..SqsConfig::default()
        })
    }

    #[tokio::test]
    async fn send_without_connection_is_a_noop() {
        let queue = unconnected();
        queue.send("hello").await;
        assert!(!queue.is_connected());
    }

    #[tokio::test]
    async fn receive_without_connection_reports_not_initialized() {
        let queue = unconnected();
        match queue.receive().await {
            ReceiveOutcome::Failed(QueueError::NotInitialized) => {}
            other => panic!("expected NotInitialized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_without_connection_is_a_noop() {
        let queue = unconnected();
        queue.delete("R1").await;
        assert!(!queue.is_connected());
    }

    #[tokio::test]
    async fn send_failure_clears_the_connected_flag() {
        let queue = unconnected();
        queue.install_client(refused_client()).await;
        assert!(queue.is_connected());

        queue.send("hello").await;
        assert!(!queue.is_connected());
    }

    #[tokio::test]
    async fn receive_failure_clears_the_connected_flag() {
        let queue = unconnected();
        queue.install_client(refused_client()).await;

        match queue.receive().await {
            ReceiveOutcome::Failed(QueueError::Backend(_)) => {}
            other => panic!("expected a backend failure, got {other:?}"),
        }
        assert!(!queue.is_connected());
    }
}
