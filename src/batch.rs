// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Batch Source Adapter
//!
//! Parses an uploaded JSON batch file into [`LogRecord`]s.
//!
//! The file is an array of objects, each with `dateTime`, `server` and
//! `message`:
//!
//! ```json
//! [
//!   { "dateTime": "2024-01-01T00:00:00Z", "server": 1, "message": "boot ok" }
//! ]
//! ```
//!
//! `dateTime` is date-time text or a number of epoch milliseconds. Only
//! structure is checked here; completeness is re-checked by the pipeline.

use std::path::Path;

use serde_json::Value;

use crate::records::{parse_time_text, LogRecord};

/// Fields every batch element must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["dateTime", "server", "message"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchParseError {
    #[error("Error parsing JSON file: {0}")]
    MalformedInput(String),

    #[error("Invalid JSON format: entry {index}: `{field}` {problem}")]
    SchemaViolation {
        index: usize,
        field: &'static str,
        problem: FieldProblem,
    },

    #[error("Cannot read batch file {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// What is wrong with a batch element's field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldProblem {
    #[error("is missing")]
    Missing,
    #[error("has an unusable value")]
    Invalid,
}

/// Parse batch file contents into records, preserving file order.
pub fn parse(contents: &str) -> Result<Vec<LogRecord>, BatchParseError> {
    let value: Value = serde_json::from_str(contents)
        .map_err(|e| BatchParseError::MalformedInput(e.to_string()))?;

    let Value::Array(entries) = value else {
        return Err(BatchParseError::MalformedInput(
            "top-level value is not an array".to_string(),
        ));
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            parse_entry(entry).map_err(|(field, problem)| BatchParseError::SchemaViolation {
                index,
                field,
                problem,
            })
        })
        .collect()
}

/// Read and parse a batch file.
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<LogRecord>, BatchParseError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| BatchParseError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse(&contents)
}

fn parse_entry(entry: &Value) -> Result<LogRecord, (&'static str, FieldProblem)> {
    // A non-object carries none of the required fields.
    let fields = entry
        .as_object()
        .ok_or((REQUIRED_FIELDS[0], FieldProblem::Missing))?;
    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !fields.contains_key(**f)) {
        return Err((*missing, FieldProblem::Missing));
    }

    let (timestamp, id_seed) =
        parse_date_time(&fields["dateTime"]).ok_or(("dateTime", FieldProblem::Invalid))?;
    let server_id = parse_server(&fields["server"]).ok_or(("server", FieldProblem::Invalid))?;
    let message = fields["message"]
        .as_str()
        .ok_or(("message", FieldProblem::Invalid))?;

    Ok(LogRecord::with_seed(timestamp, server_id, message, id_seed))
}

/// Epoch seconds plus the raw text the identifier is seeded with.
///
/// Text must be a recognised date-time; numbers are epoch milliseconds.
fn parse_date_time(value: &Value) -> Option<(i64, String)> {
    match value {
        Value::String(text) => parse_time_text(text).map(|seconds| (seconds, text.clone())),
        Value::Number(n) => n
            .as_f64()
            .map(|millis| ((millis / 1000.0).floor() as i64, n.to_string())),
        _ => None,
    }
}

fn parse_server(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn non_array_is_malformed() {
        assert!(matches!(
            parse(r#"{"not": "an array"}"#),
            Err(BatchParseError::MalformedInput(_))
        ));
        assert!(matches!(parse("not json"), Err(BatchParseError::MalformedInput(_))));
    }

    #[test]
    fn missing_message_is_a_schema_violation() {
        let err = parse(r#"[{"dateTime":"2024-01-01T00:00:00Z","server":1}]"#).unwrap_err();
        assert_eq!(
            err,
            BatchParseError::SchemaViolation {
                index: 0,
                field: "message",
                problem: FieldProblem::Missing,
            }
        );
        assert_eq!(
            err.to_string(),
            "Invalid JSON format: entry 0: `message` is missing"
        );
    }

    #[test]
    fn non_object_entry_reports_the_first_required_field() {
        let err = parse(r#"[{"dateTime":"2024-01-01","server":1,"message":"x"}, 7]"#).unwrap_err();
        assert_eq!(
            err,
            BatchParseError::SchemaViolation {
                index: 1,
                field: "dateTime",
                problem: FieldProblem::Missing,
            }
        );
    }

    #[test]
    fn records_keep_file_order_and_raw_seed() {
        let records = parse(
            r#"[
                {"dateTime": "2024-01-01T00:00:00Z", "server": 1, "message": "first"},
                {"dateTime": "2024-01-01 01:00:00", "server": "2", "message": "second"},
                {"dateTime": 1704074400000, "server": 3, "message": "third"}
            ]"#,
        )
        .unwrap();

        let messages: Vec<_> = records.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);

        assert_eq!(records[0].timestamp, 1_704_067_200);
        assert_eq!(records[0].id_seed, "2024-01-01T00:00:00Z");
        assert_eq!(records[1].timestamp, 1_704_070_800);
        assert_eq!(records[1].server_id, 2);
        assert_eq!(records[2].timestamp, 1_704_074_400);
        assert_eq!(records[2].id_seed, "1704074400000");
    }

    #[test]
    fn empty_message_is_left_to_the_pipeline() {
        let records =
            parse(r#"[{"dateTime":"2024-01-01T00:00:00Z","server":1,"message":""}]"#).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].validate().is_err());
    }

    #[test]
    fn bad_field_values_are_schema_violations() {
        let err = parse(r#"[{"dateTime":"soon","server":1,"message":"x"}]"#).unwrap_err();
        assert_eq!(
            err,
            BatchParseError::SchemaViolation {
                index: 0,
                field: "dateTime",
                problem: FieldProblem::Invalid,
            }
        );

        let err = parse(
            r#"[{"dateTime":"2024-01-01","server":1,"message":"x"},
                {"dateTime":"2024-01-01","server":"db-1","message":"x"}]"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BatchParseError::SchemaViolation { index: 1, field: "server", .. }
        ));
    }

    #[test]
    fn load_file_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"dateTime":"2024-01-01T00:00:00Z","server":1,"message":"from disk"}}]"#
        )
        .unwrap();

        let records = load_file(file.path()).unwrap();
        assert_eq!(records[0].message, "from disk");

        let missing = load_file("/nonexistent/batch.json").unwrap_err();
        assert!(matches!(missing, BatchParseError::Unreadable { .. }));
    }
}
