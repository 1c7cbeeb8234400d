// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Log Records
//!
//! A [`LogRecord`] is one entry to be written on-chain. Records come from a
//! single form submission or from a batch file; both end up here.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One log entry awaiting submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub server_id: u64,
    pub message: String,
    /// Raw time input the identifier is derived from.
    pub id_seed: String,
}

impl LogRecord {
    /// Record from form input; the identifier seed is the decimal timestamp.
    pub fn new(timestamp: i64, server_id: u64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            server_id,
            message: message.into(),
            id_seed: timestamp.to_string(),
        }
    }

    /// Record whose identifier seed is the original time text (batch files).
    pub fn with_seed(
        timestamp: i64,
        server_id: u64,
        message: impl Into<String>,
        id_seed: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            server_id,
            message: message.into(),
            id_seed: id_seed.into(),
        }
    }

    /// Check that every field is present and non-empty.
    pub fn validate(&self) -> Result<(), RecordField> {
        if self.timestamp <= 0 {
            return Err(RecordField::Timestamp);
        }
        if self.server_id == 0 {
            return Err(RecordField::Server);
        }
        if self.message.trim().is_empty() {
            return Err(RecordField::Message);
        }
        if self.id_seed.is_empty() {
            return Err(RecordField::TimeInput);
        }
        Ok(())
    }
}

/// A record field that must be present and non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Timestamp,
    Server,
    Message,
    TimeInput,
}

impl RecordField {
    pub fn name(&self) -> &'static str {
        match self {
            RecordField::Timestamp => "timestamp",
            RecordField::Server => "server",
            RecordField::Message => "message",
            RecordField::TimeInput => "time input",
        }
    }
}

/// Why a set of records cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("no log records to submit")]
    NoRecords,

    #[error("record {index}: {} is missing or empty", .field.name())]
    Incomplete { index: usize, field: RecordField },

    #[error("single mode takes exactly one record, got {0}")]
    NotSingle(usize),
}

/// Validate a whole submission: at least one record, each one complete.
pub fn validate_records(records: &[LogRecord]) -> Result<(), RecordError> {
    if records.is_empty() {
        return Err(RecordError::NoRecords);
    }
    for (index, record) in records.iter().enumerate() {
        record
            .validate()
            .map_err(|field| RecordError::Incomplete { index, field })?;
    }
    Ok(())
}

/// Parse date-time text to epoch seconds.
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00Z`, with offset), naive date-times
/// read as UTC (`2024-01-01T00:00:00`, `2024-01-01 00:00:00`) and bare dates.
pub fn parse_time_text(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp())
}

/// Parse form time input: integer epoch seconds or date-time text.
pub fn parse_time_input(input: &str) -> Option<i64> {
    input
        .trim()
        .parse::<i64>()
        .ok()
        .or_else(|| parse_time_text(input))
}
