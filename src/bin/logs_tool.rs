//! Offline logs tool: parse a log file into the store, or run a
//! filtered query against the collection.
//!
//! Uses the same environment configuration as the relay service for
//! the store connection.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use chrono::{DateTime, NaiveDateTime, Utc};
use mongodb::bson::{Bson, Document};
use tracing_subscriber::EnvFilter;

use event_relay::config::RelayConfig;
use event_relay::logs::parse_log_file;
use event_relay::persistence::mongo::{MongoConfig, MongoSink};

/// Timestamp layouts accepted for `--value` on datetime queries.
const VALUE_TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S,%3f",
    "%Y-%m-%d %H:%M:%S,%6f",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Parser)]
#[command(name = "logs-tool", about = "Parse log files into the store and query them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a log file and insert every line into the collection.
    Ingest {
        /// Path to the log file.
        file: PathBuf,
    },
    /// Run a filtered query `{key: {op: value}}` against the collection.
    Query {
        /// Document key to filter on (e.g. `severity`, `datetime`).
        #[arg(long)]
        key: String,
        /// Comparison operator.
        #[arg(long, value_enum)]
        op: FilterOp,
        /// Value to compare against; timestamps and integers are
        /// detected, everything else is matched as a string.
        #[arg(long)]
        value: String,
    },
}

/// Comparison operators mapped to the store's query syntax.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
}

impl FilterOp {
    const fn as_mongo(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
        }
    }
}

/// Converts a CLI value into the representation records are stored
/// with: timestamps take the exact string form the sink serializes
/// `datetime` to, integers stay numeric, everything else is a string.
fn to_bson_value(raw: &str) -> Bson {
    for fmt in VALUE_TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Bson::String(stored_datetime_repr(naive.and_utc()));
        }
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Bson::Int64(n);
    }
    Bson::String(raw.to_string())
}

/// The string form `LogRecord.datetime` is stored as: chrono's
/// serialized layout, `Z`-suffixed with minimal fractional digits.
/// `to_rfc3339` would emit `+00:00` instead and never match.
fn stored_datetime_repr(datetime: DateTime<Utc>) -> String {
    datetime.format("%Y-%m-%dT%H:%M:%S%.fZ").to_string()
}

/// Renders a stored log document back into its original
/// `timestamp - service - LEVEL - message` line shape.
fn format_log_entry(document: &Document) -> Option<String> {
    let raw = document.get_str("datetime").ok()?;
    let datetime = DateTime::parse_from_rfc3339(raw).ok()?;
    let service = document.get_str("service").ok()?;
    let severity = document.get_str("severity").ok()?;
    let message = document.get_str("message").ok()?;
    Some(format!(
        "{} - {service} - {severity} - {message}",
        datetime.format("%Y-%m-%d %H:%M:%S,%3f")
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = RelayConfig::from_env()
        .map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;
    let sink = MongoSink::new(MongoConfig {
        uri: config.mongodb_uri,
        database: config.database_name,
        collection: config.collection_name,
    });

    match cli.command {
        Command::Ingest { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let records = parse_log_file(&content)?;
            if records.is_empty() {
                bail!("no log lines found in {}", file.display());
            }
            let count = records.len();
            sink.insert_logs(records).await?;
            tracing::info!(count, "log records inserted");
        }
        Command::Query { key, op, value } => {
            let documents = sink.find(&key, op.as_mongo(), to_bson_value(&value)).await?;
            if documents.is_empty() {
                tracing::info!("no logs found that meet the requirements");
            }
            for document in documents {
                match format_log_entry(&document) {
                    Some(line) => println!("{line}"),
                    None => tracing::error!(?document, "log entry is missing expected fields"),
                }
            }
        }
    }

    Ok(())
}
