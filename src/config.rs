//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Required backend settings that are
//! absent are logged as errors but do not halt startup — the dependent
//! client then fails (and logs) at first use instead.

use std::net::SocketAddr;

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8000`).
    pub listen_addr: SocketAddr,

    /// AWS region for the queue client.
    pub aws_region: Option<String>,

    /// Custom queue endpoint URL (LocalStack or similar).
    pub aws_endpoint_url: Option<String>,

    /// URL of the worker queue to send to and receive from.
    pub queue_url: Option<String>,

    /// MongoDB connection string.
    pub mongodb_uri: Option<String>,

    /// Database holding the event collection.
    pub database_name: Option<String>,

    /// Collection that persisted records are appended to.
    pub collection_name: Option<String>,

    /// Long-poll wait window for queue receives, in seconds.
    pub receive_wait_secs: i32,

    /// Capacity of the fire-and-forget dispatch buffer.
    pub dispatch_buffer: usize,

    /// Number of dispatcher worker tasks.
    pub dispatch_workers: usize,
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    /// Each required backend variable that is missing produces an error
    /// log, mirroring the degraded-at-first-use startup contract.
    ///
    /// # Errors
    ///
    /// Returns an error only if `API_PORT` is set but cannot be parsed
    /// as a port number.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let port: u16 = match std::env::var("API_PORT") {
            Ok(raw) => raw.parse()?,
            Err(_) => {
                tracing::error!("API_PORT not set.");
                8000
            }
        };
        let listen_addr = SocketAddr::from(([0, 0, 0, 0], port));

        let aws_region = require_env("AWS_DEFAULT_REGION");
        let aws_endpoint_url = require_env("AWS_ENDPOINT_URL");
        // Credentials are picked up by the AWS provider chain; checked
        // here only so a missing key is reported at startup.
        require_env("AWS_ACCESS_KEY_ID");
        require_env("AWS_SECRET_ACCESS_KEY");
        let queue_url = require_env("WORKER_QUEUE_URL");

        let mongodb_uri = require_env("MONGODB_URI");
        let database_name = require_env("DATABASE_NAME");
        let collection_name = require_env("COLLECTION_NAME");

        let receive_wait_secs = parse_env("RECEIVE_WAIT_SECS", 20);
        let dispatch_buffer = parse_env("DISPATCH_BUFFER", 1024);
        let dispatch_workers = parse_env("DISPATCH_WORKERS", 4);

        Ok(Self {
            listen_addr,
            aws_region,
            aws_endpoint_url,
            queue_url,
            mongodb_uri,
            database_name,
            collection_name,
            receive_wait_secs,
            dispatch_buffer,
            dispatch_workers,
        })
    }
}

/// Reads a required environment variable, logging an error when it is
/// missing or empty. Startup continues either way.
fn require_env(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => {
            tracing::debug!(key, "environment variable set");
            Some(value)
        }
        _ => {
            tracing::error!("{key} not set.");
            None
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn missing_variables_do_not_halt_startup() {
        for key in [
            "API_PORT",
            "AWS_DEFAULT_REGION",
            "WORKER_QUEUE_URL",
            "MONGODB_URI",
        ] {
            std::env::remove_var(key);
        }

        let Ok(config) = RelayConfig::from_env() else {
            panic!("startup must survive missing variables");
        };
        assert_eq!(config.listen_addr.port(), 8000);
        assert!(config.queue_url.is_none());
        assert!(config.mongodb_uri.is_none());
    }

    #[test]
    #[serial]
    fn reads_port_and_backend_settings() {
        std::env::set_var("API_PORT", "9100");
        std::env::set_var("WORKER_QUEUE_URL", "http://localhost:4566/000000000000/worker");
        std::env::set_var("MONGODB_URI", "mongodb://localhost:27017");

        let Ok(config) = RelayConfig::from_env() else {
            panic!("config should load");
        };
        assert_eq!(config.listen_addr.port(), 9100);
        assert_eq!(
            config.queue_url.as_deref(),
            Some("http://localhost:4566/000000000000/worker")
        );

        for key in ["API_PORT", "WORKER_QUEUE_URL", "MONGODB_URI"] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn invalid_port_is_an_error() {
        std::env::set_var("API_PORT", "not-a-port");
        let result = RelayConfig::from_env();
        assert!(result.is_err());
        std::env::remove_var("API_PORT");
    }

    #[test]
    #[serial]
    fn dispatcher_defaults_apply() {
        std::env::remove_var("DISPATCH_BUFFER");
        std::env::remove_var("DISPATCH_WORKERS");
        std::env::remove_var("API_PORT");

        let Ok(config) = RelayConfig::from_env() else {
            panic!("config should load");
        };
        assert_eq!(config.dispatch_buffer, 1024);
        assert_eq!(config.dispatch_workers, 4);
        assert_eq!(config.receive_wait_secs, 20);
    }
}
