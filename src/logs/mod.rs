//! Offline log-file parsing for the logs tool.
//!
//! Lines follow the classic `timestamp - service - LEVEL - message`
//! shape. The message field may itself contain the ` - ` separator;
//! surplus splits are folded back into it. Parsing is
//! all-or-nothing per file: one malformed line rejects the whole file.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::persistence::LogRecord;

/// Field separator between the four log-line parts.
const SEPARATOR: &str = " - ";

/// Accepted timestamp layouts (milliseconds, then microseconds).
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S,%3f", "%Y-%m-%d %H:%M:%S,%6f"];

/// Log-line parse failures.
#[derive(Debug, Clone, Error)]
pub enum LogParseError {
    /// Fewer than four ` - `-separated fields.
    #[error("log line is malformed, not enough parts: {line}")]
    MalformedLine {
        /// The offending line.
        line: String,
    },

    /// First field did not parse as a timestamp.
    #[error("timestamp format is incorrect: {value}")]
    BadTimestamp {
        /// The offending timestamp field.
        value: String,
    },

    /// A line inside a file failed to parse.
    #[error("error parsing line {line_number}: {source}")]
    InFile {
        /// 1-based line number within the file.
        line_number: usize,
        /// The underlying line error.
        #[source]
        source: Box<LogParseError>,
    },
}

/// Parses a single log line into a [`LogRecord`].
///
/// # Errors
///
/// Returns [`LogParseError::MalformedLine`] when the line has fewer
/// than four fields and [`LogParseError::BadTimestamp`] when the
/// timestamp field does not match any accepted layout.
pub fn parse_log_line(line: &str) -> Result<LogRecord, LogParseError> {
    let mut parts = line.splitn(4, SEPARATOR);
    let (Some(timestamp_str), Some(service), Some(severity), Some(message)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(LogParseError::MalformedLine {
            line: line.to_string(),
        });
    };

    let timestamp_str = timestamp_str.trim();
    let naive = TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(timestamp_str, fmt).ok())
        .ok_or_else(|| LogParseError::BadTimestamp {
            value: timestamp_str.to_string(),
        })?;

    Ok(LogRecord {
        datetime: naive.and_utc(),
        service: service.trim().to_string(),
        severity: severity.trim().to_string(),
        message: message.trim().to_string(),
    })
}

/// Parses an entire log file, skipping blank lines.
///
/// # Errors
///
/// Returns [`LogParseError::InFile`] carrying the 1-based line number
/// of the first malformed line; nothing is returned for a partially
/// valid file.
pub fn parse_log_file(content: &str) -> Result<Vec<LogRecord>, LogParseError> {
    let mut records = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_log_line(line).map_err(|source| LogParseError::InFile {
            line_number: i + 1,
            source: Box::new(source),
        })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const LINE: &str = "2024-03-01 12:30:45,123 - ingest - INFO - message sent to queue";

    #[test]
    fn parses_a_well_formed_line() {
        let Ok(record) = parse_log_line(LINE) else {
            panic!("line should parse");
        };
        assert_eq!(record.service, "ingest");
        assert_eq!(record.severity, "INFO");
        assert_eq!(record.message, "message sent to queue");
        assert_eq!(record.datetime.year(), 2024);
        assert_eq!(record.datetime.hour(), 12);
        assert_eq!(record.datetime.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn separator_inside_message_is_preserved() {
        let line = "2024-03-01 12:30:45,123 - api - ERROR - upstream said - try again - later";
        let Ok(record) = parse_log_line(line) else {
            panic!("line should parse");
        };
        assert_eq!(record.message, "upstream said - try again - later");
    }

    #[test]
    fn short_line_is_malformed() {
        let result = parse_log_line("2024-03-01 12:30:45,123 - api - INFO");
        assert!(matches!(result, Err(LogParseError::MalformedLine { .. })));
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let result = parse_log_line("yesterday - api - INFO - hello");
        assert!(matches!(result, Err(LogParseError::BadTimestamp { .. })));
    }

    #[test]
    fn microsecond_timestamps_parse_too() {
        let line = "2024-03-01 12:30:45,123456 - api - INFO - hello";
        assert!(parse_log_line(line).is_ok());
    }

    #[test]
    fn file_parses_and_skips_blank_lines() {
        let content = format!("{LINE}\n\n{LINE}\n");
        let Ok(records) = parse_log_file(&content) else {
            panic!("file should parse");
        };
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn one_bad_line_rejects_the_file() {
        let content = format!("{LINE}\nnot a log line\n{LINE}\n");
        let result = parse_log_file(&content);
        let Err(LogParseError::InFile { line_number, .. }) = result else {
            panic!("expected a file-level error");
        };
        assert_eq!(line_number, 2);
    }
}
