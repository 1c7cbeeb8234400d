// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Human-readable rendering of submission status.

use alloy::primitives::Address;

use crate::pipeline::{SubmissionMode, SubmissionState, SubmissionStatus};

/// Known log servers, `(id, name)`.
pub const SERVER_OPTIONS: [(u64, &str); 3] =
    [(1, "logUbuntuDemo1"), (2, "Server 2"), (3, "Server 3")];

/// Display name of a server id.
pub fn server_name(id: u64) -> &'static str {
    SERVER_OPTIONS
        .iter()
        .find(|(option, _)| *option == id)
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

/// Shorten an address to `0x1234...abcd`.
pub fn format_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Status line for the current state of an attempt. Empty while idle.
pub fn describe(status: &SubmissionStatus) -> String {
    let batch = status.mode == SubmissionMode::Batch;
    match &status.state {
        SubmissionState::Idle => String::new(),
        SubmissionState::Preparing if batch => "Preparing batch transaction...".to_string(),
        SubmissionState::Preparing => "Preparing transaction...".to_string(),
        SubmissionState::AwaitingSignature if batch => format!(
            "Submitting a batch of {} logs. Please confirm the transaction in your wallet...",
            status.record_count
        ),
        SubmissionState::AwaitingSignature => {
            "Please confirm the transaction in your wallet...".to_string()
        }
        SubmissionState::Pending { tx_hash } => {
            format!("Transaction sent! Waiting for confirmation... Hash: {tx_hash}")
        }
        SubmissionState::Confirmed { .. } if batch => {
            "Batch transaction confirmed successfully!".to_string()
        }
        SubmissionState::Confirmed { .. } => "Transaction confirmed successfully!".to_string(),
        SubmissionState::Failed { failure } => format!("Error: {failure}"),
    }
}

/// What the user can do about a failed attempt.
pub fn remediation(status: &SubmissionStatus) -> Option<&'static str> {
    match &status.state {
        SubmissionState::Failed { failure } => Some(failure.category().hint()),
        _ => None,
    }
}
