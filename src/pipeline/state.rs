// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Submission lifecycle states and the published status snapshot.

use alloy::primitives::B256;
use serde::Serialize;

use crate::blockchain::{DecodedEvent, Receipt};
use crate::error::SubmissionFailure;

/// Lifecycle of one submission attempt.
///
/// `Idle → Preparing → AwaitingSignature → Pending → Confirmed | Failed`.
/// `Confirmed` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Preparing,
    AwaitingSignature,
    Pending {
        tx_hash: B256,
    },
    Confirmed {
        receipt: Receipt,
        events: Vec<DecodedEvent>,
    },
    Failed {
        failure: SubmissionFailure,
    },
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Confirmed { .. } | SubmissionState::Failed { .. }
        )
    }

    /// Preparing, awaiting signature or pending.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            SubmissionState::Preparing
                | SubmissionState::AwaitingSignature
                | SubmissionState::Pending { .. }
        )
    }

    /// Short machine-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Preparing => "preparing",
            SubmissionState::AwaitingSignature => "awaiting_signature",
            SubmissionState::Pending { .. } => "pending",
            SubmissionState::Confirmed { .. } => "confirmed",
            SubmissionState::Failed { .. } => "failed",
        }
    }
}

/// Which contract entry point an attempt uses.
///
/// Chosen by the caller from where the records came from, never from how
/// many there are: a batch file with one entry is still a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    Single,
    Batch,
}

/// Snapshot published to subscribers after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionStatus {
    /// Attempt number, starting at 1. Zero before the first attempt.
    pub attempt: u64,
    pub mode: SubmissionMode,
    pub record_count: usize,
    pub state: SubmissionState,
    /// Known from `Pending` onwards.
    pub tx_hash: Option<B256>,
    /// Decoded events, once confirmed.
    pub events: Vec<DecodedEvent>,
    /// Human-readable error, once failed.
    pub error: Option<String>,
}

impl SubmissionStatus {
    pub fn idle() -> Self {
        Self::begin(0, SubmissionMode::Single, 0)
    }

    pub(crate) fn begin(attempt: u64, mode: SubmissionMode, record_count: usize) -> Self {
        Self {
            attempt,
            mode,
            record_count,
            state: SubmissionState::Idle,
            tx_hash: None,
            events: Vec::new(),
            error: None,
        }
    }

    /// Apply a transition, carrying the hash/events/error fields along.
    pub(crate) fn advance(&mut self, state: SubmissionState) {
        match &state {
            SubmissionState::Pending { tx_hash } => self.tx_hash = Some(*tx_hash),
            SubmissionState::Confirmed { receipt, events } => {
                self.tx_hash = Some(receipt.tx_hash);
                self.events = events.clone();
            }
            SubmissionState::Failed { failure } => self.error = Some(failure.to_string()),
            _ => {}
        }
        self.state = state;
    }
}
