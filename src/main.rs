//! event-relay server entry point.
//!
//! Starts the Axum HTTP server and the background queue consumer.

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use event_relay::api;
use event_relay::app_state::AppState;
use event_relay::config::RelayConfig;
use event_relay::persistence::mongo::{MongoConfig, MongoSink};
use event_relay::persistence::EventSink;
use event_relay::queue::sqs::{SqsConfig, SqsQueue};
use event_relay::queue::EventQueue;
use event_relay::service::{spawn_consumer, Dispatcher};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration; missing backend variables degrade the
    // dependent client rather than halting startup.
    let config = RelayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting event-relay");

    // Build backend clients once and inject them everywhere.
    let queue = Arc::new(SqsQueue::new(SqsConfig {
        region: config.aws_region.clone(),
        endpoint_url: config.aws_endpoint_url.clone(),
        queue_url: config.queue_url.clone(),
        wait_time_secs: config.receive_wait_secs,
    }));
    queue.spawn_reconnect();

    let store: Arc<dyn EventSink> = Arc::new(MongoSink::new(MongoConfig {
        uri: config.mongodb_uri.clone(),
        database: config.database_name.clone(),
        collection: config.collection_name.clone(),
    }));

    // Bounded fire-and-forget pool for ingress sends and consumer acks.
    let dispatcher = Dispatcher::spawn(
        Arc::clone(&queue) as Arc<dyn EventQueue>,
        config.dispatch_buffer,
        config.dispatch_workers,
    );

    // Background consumer runs for the process lifetime.
    spawn_consumer(
        Arc::clone(&queue) as Arc<dyn EventQueue>,
        Arc::clone(&store),
        dispatcher.clone(),
    );

    // Build application state
    let app_state = AppState {
        queue: queue as Arc<dyn EventQueue>,
        store,
        dispatcher,
    };

    // Build router
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
