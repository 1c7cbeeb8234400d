// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Submission errors.
//!
//! Two layers:
//! - [`SubmitError`]: the request was refused before an attempt started.
//!   Nothing was published and the caller may retry immediately.
//! - [`SubmissionFailure`]: the attempt started and ended in `Failed`.
//!   Terminal for that attempt; a retry is a new attempt.

use std::time::Duration;

use serde::Serialize;

use crate::batch::BatchParseError;
use crate::records::RecordError;
use crate::wallet::ProviderRpcError;

/// Generic text used when a wallet rejects without a message.
pub const GENERIC_REJECTION: &str = "Transaction rejected.";

/// Submit request refused before any state change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("Wallet not connected or contract not initialized.")]
    NotConnected,

    #[error("Invalid input: {0}")]
    InvalidInput(RecordError),

    #[error("A submission is already in progress.")]
    SubmissionInProgress,
}

/// Why an attempt ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SubmissionFailure {
    #[error("Failed to read the latest block: {0}")]
    ChainReadError(String),

    #[error("{}", .message.as_deref().unwrap_or(GENERIC_REJECTION))]
    TransactionRejected {
        message: Option<String>,
        /// The user declined in the wallet, as opposed to the wallet failing.
        by_user: bool,
    },

    #[error("Failed waiting for the transaction receipt: {0}")]
    ChainWaitError(String),

    #[error("Contract reverted: {}", .reason.as_deref().unwrap_or("no reason given"))]
    ContractReverted { reason: Option<String> },

    #[error("Timed out after {}s waiting for the transaction receipt", .0.as_secs())]
    Timeout(#[serde(with = "duration_secs")] Duration),
}

impl SubmissionFailure {
    /// Classify a signing/broadcast error reported by the wallet.
    ///
    /// A node that reverts the call while estimating gas never broadcasts;
    /// that is still the contract refusing the entries.
    pub fn from_send_error(err: ProviderRpcError) -> Self {
        if err.is_revert() {
            return SubmissionFailure::ContractReverted {
                reason: err.revert_reason(),
            };
        }
        let message = Some(err.message.trim().to_string()).filter(|m| !m.is_empty());
        SubmissionFailure::TransactionRejected {
            message,
            by_user: err.is_user_rejection(),
        }
    }

    pub fn category(&self) -> FailureCategory {
        match self {
            SubmissionFailure::TransactionRejected { by_user: true, .. } => {
                FailureCategory::RejectedByUser
            }
            SubmissionFailure::ContractReverted { .. } => FailureCategory::ContractReverted,
            SubmissionFailure::ChainReadError(_)
            | SubmissionFailure::TransactionRejected { by_user: false, .. }
            | SubmissionFailure::ChainWaitError(_)
            | SubmissionFailure::Timeout(_) => FailureCategory::ChainOrNetwork,
        }
    }
}

/// Coarse grouping of failures; remediation differs per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    RejectedByUser,
    ChainOrNetwork,
    ContractReverted,
}

impl FailureCategory {
    pub fn hint(&self) -> &'static str {
        match self {
            FailureCategory::RejectedByUser => {
                "The request was declined in the wallet. Submit again to retry."
            }
            FailureCategory::ChainOrNetwork => {
                "Check the wallet's network connection and account, then retry."
            }
            FailureCategory::ContractReverted => {
                "The contract rejected the entries. Check the log input before retrying."
            }
        }
    }
}

/// Errors from the log writer's combined operations.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error(transparent)]
    Batch(#[from] BatchParseError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}
