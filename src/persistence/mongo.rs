//! MongoDB implementation of the persistence sink.
//!
//! The client slot is established lazily and health-checked with a
//! `ping` before every insert attempt; a failed ping triggers one
//! reconnect via [`Client::with_uri_str`]. Write failures are logged
//! and the records dropped — there is no retry queue or dead-letter
//! path, by contract.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Collection};
use tracing::{debug, error, info};

use super::models::{LogRecord, PersistedRecord};
use super::EventSink;
use crate::error::RelayError;

/// Connection settings for the document store.
#[derive(Debug, Clone, Default)]
pub struct MongoConfig {
    /// Connection string.
    pub uri: Option<String>,
    /// Database holding the event collection.
    pub database: Option<String>,
    /// Collection that records are appended to.
    pub collection: Option<String>,
}

/// MongoDB-backed [`EventSink`].
///
/// `mongodb::Client` maintains its own connection pool and is safe to
/// share across tasks; the `RwLock` only guards the lazily-filled slot.
#[derive(Debug)]
pub struct MongoSink {
    config: MongoConfig,
    client: tokio::sync::RwLock<Option<Client>>,
    connected: AtomicBool,
}

impl MongoSink {
    /// Creates an unconnected sink; the connection is established on
    /// first use.
    #[must_use]
    pub fn new(config: MongoConfig) -> Self {
        Self {
            config,
            client: tokio::sync::RwLock::new(None),
            connected: AtomicBool::new(false),
        }
    }

    /// Returns a healthy client, connecting or reconnecting as needed.
    ///
    /// The existing client is pinged first; when the ping fails (or no
    /// client exists yet) a fresh connection is attempted. On failure
    /// the error is logged and `None` is returned, leaving every
    /// dependent operation a no-op until a later attempt succeeds.
    async fn ensure_connected(&self) -> Option<Client> {
        {
            let guard = self.client.read().await;
            if let Some(client) = guard.as_ref() {
                if ping(client).await {
                    return Some(client.clone());
                }
            }
        }

        let Some(uri) = self.config.uri.as_deref() else {
            error!("MONGODB_URI not configured; store operation dropped");
            return None;
        };

        let mut guard = self.client.write().await;
        // Another task may have reconnected while we waited for the lock.
        if let Some(client) = guard.as_ref() {
            if ping(client).await {
                return Some(client.clone());
            }
        }

        match Client::with_uri_str(uri).await {
            Ok(client) => {
                if ping(&client).await {
                    info!("connected to database");
                    *guard = Some(client.clone());
                    self.connected.store(true, Ordering::SeqCst);
                    Some(client)
                } else {
                    *guard = None;
                    self.connected.store(false, Ordering::SeqCst);
                    None
                }
            }
            Err(e) => {
                error!(error = %e, "failed to connect to MongoDB");
                *guard = None;
                self.connected.store(false, Ordering::SeqCst);
                None
            }
        }
    }

    /// Resolves the configured collection, logging when names are
    /// missing from the environment.
    fn collection<T: Send + Sync>(&self, client: &Client) -> Option<Collection<T>> {
        let Some(database) = self.config.database.as_deref() else {
            error!("DATABASE_NAME not configured; store operation dropped");
            return None;
        };
        let Some(collection) = self.config.collection.as_deref() else {
            error!("COLLECTION_NAME not configured; store operation dropped");
            return None;
        };
        Some(client.database(database).collection(collection))
    }

    /// Appends parsed log records to the collection (logs tool).
    ///
    /// # Errors
    ///
    /// Returns a [`RelayError::Store`] when the connection cannot be
    /// established or the write fails.
    pub async fn insert_logs(&self, records: Vec<LogRecord>) -> Result<(), RelayError> {
        let client = self
            .ensure_connected()
            .await
            .ok_or_else(|| RelayError::Store("store connection unavailable".to_string()))?;
        let collection: Collection<LogRecord> = self
            .collection(&client)
            .ok_or_else(|| RelayError::Store("store collection not configured".to_string()))?;

        collection
            .insert_many(records)
            .await
            .map_err(|e| RelayError::Store(e.to_string()))?;
        Ok(())
    }

    /// Runs a filtered query `{key: {op: value}}` against the
    /// collection (logs tool).
    ///
    /// # Errors
    ///
    /// Returns a [`RelayError::Store`] when the connection cannot be
    /// established or the query fails.
    pub async fn find(
        &self,
        key: &str,
        op: &str,
        value: Bson,
    ) -> Result<Vec<Document>, RelayError> {
        let client = self
            .ensure_connected()
            .await
            .ok_or_else(|| RelayError::Store("store connection unavailable".to_string()))?;
        let collection: Collection<Document> = self
            .collection(&client)
            .ok_or_else(|| RelayError::Store("store collection not configured".to_string()))?;

        let mut condition = Document::new();
        condition.insert(op, value);
        let mut filter = Document::new();
        filter.insert(key, condition);
        let cursor = collection
            .find(filter)
            .await
            .map_err(|e| RelayError::Store(e.to_string()))?;
        cursor
            .try_collect()
            .await
            .map_err(|e| RelayError::Store(e.to_string()))
    }
}

/// Health probe: `{ping: 1}` against the admin database.
async fn ping(client: &Client) -> bool {
    match client.database("admin").run_command(doc! { "ping": 1 }).await {
        Ok(_) => true,
        Err(e) => {
            error!(error = %e, "database ping failed");
            false
        }
    }
}

#[async_trait]
impl EventSink for MongoSink {
    async fn insert(&self, records: Vec<PersistedRecord>) {
        let Some(client) = self.ensure_connected().await else {
            return;
        };
        let Some(collection) = self.collection::<PersistedRecord>(&client) else {
            return;
        };

        match collection.insert_many(&records).await {
            Ok(_) => {
                info!(count = records.len(), "inserted records");
                debug!(?records, "inserted record contents");
            }
            Err(e) => error!(error = %e, "failed to insert records"),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_without_uri_is_a_noop() {
        let sink = MongoSink::new(MongoConfig::default());
        sink.insert(vec![PersistedRecord::new("hello")]).await;
        assert!(!sink.is_connected());
    }

    #[tokio::test]
    async fn insert_logs_without_uri_is_an_error() {
        let sink = MongoSink::new(MongoConfig::default());
        let result = sink.insert_logs(Vec::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn find_without_uri_is_an_error() {
        let sink = MongoSink::new(MongoConfig::default());
        let result = sink.find("severity", "$eq", Bson::from("ERROR")).await;
        assert!(result.is_err());
    }
}
