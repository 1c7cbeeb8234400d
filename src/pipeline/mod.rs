// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Log Submission Pipeline
//!
//! Drives one submission attempt from request to a terminal state:
//!
//! 1. **Guards** (no state change): a bound contract must exist, every record
//!    must be complete, and no other attempt may be in flight.
//! 2. **Preparing**: one latest-block read, then an independently salted
//!    identifier per record.
//! 3. **AwaitingSignature**: `emitLog` in single mode, `emitLogsBatch` in
//!    batch mode (whatever the record count), sent through the session's
//!    signer.
//! 4. **Pending**: the transaction hash is published as soon as the wallet
//!    broadcasts.
//! 5. **Confirmed / Failed**: the receipt is awaited (bounded by
//!    `receipt_timeout` when set) and the contract's events decoded.
//!
//! Every transition is broadcast as a [`SubmissionStatus`]. Nothing is
//! retried automatically; a failed attempt stays failed.

pub mod identifier;
pub mod state;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::B256;
use tokio::sync::broadcast;
use tracing::{info, warn};

pub use identifier::{
    prepare_entries, LogIdentifier, PreparedEntry, RandomSalt, SaltSource, SALT_MAX, SALT_MIN,
};
pub use state::{SubmissionMode, SubmissionState, SubmissionStatus};

use crate::blockchain::{ContractHandle, Receipt};
use crate::error::{SubmissionFailure, SubmitError};
use crate::records::{validate_records, LogRecord, RecordError};
use crate::wallet::{NetworkHandle, WalletProvider};

/// Status updates buffered per subscriber.
const STATUS_CHANNEL_CAPACITY: usize = 32;

/// Submission state machine with an at-most-one-in-flight guard.
pub struct SubmissionPipeline<S = RandomSalt> {
    salts: Mutex<S>,
    receipt_timeout: Option<Duration>,
    in_flight: AtomicBool,
    attempts: AtomicU64,
    current: Mutex<SubmissionStatus>,
    updates: broadcast::Sender<SubmissionStatus>,
}

impl SubmissionPipeline<RandomSalt> {
    /// Pipeline with random salts. `receipt_timeout: None` waits indefinitely.
    pub fn new(receipt_timeout: Option<Duration>) -> Self {
        Self::with_salt_source(RandomSalt::default(), receipt_timeout)
    }
}

impl<S: SaltSource> SubmissionPipeline<S> {
    pub fn with_salt_source(salts: S, receipt_timeout: Option<Duration>) -> Self {
        let (updates, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            salts: Mutex::new(salts),
            receipt_timeout,
            in_flight: AtomicBool::new(false),
            attempts: AtomicU64::new(0),
            current: Mutex::new(SubmissionStatus::idle()),
            updates,
        }
    }

    /// Receive every status transition from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SubmissionStatus> {
        self.updates.subscribe()
    }

    /// Latest published status.
    pub fn current(&self) -> SubmissionStatus {
        match self.current.lock() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Whether an attempt is preparing, awaiting signature or pending.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn receipt_timeout(&self) -> Option<Duration> {
        self.receipt_timeout
    }

    /// Run one submission attempt.
    ///
    /// Returns `Err` only when the request is refused up front. Once an
    /// attempt starts, the result is its terminal state (`Confirmed` or
    /// `Failed`), which has also been published.
    pub async fn submit<P: WalletProvider>(
        &self,
        contract: Option<&ContractHandle<'_, P>>,
        mode: SubmissionMode,
        records: &[LogRecord],
    ) -> Result<SubmissionState, SubmitError> {
        let contract = contract.ok_or(SubmitError::NotConnected)?;
        validate_records(records).map_err(SubmitError::InvalidInput)?;
        if mode == SubmissionMode::Single && records.len() != 1 {
            return Err(SubmitError::InvalidInput(RecordError::NotSingle(records.len())));
        }
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(SubmitError::SubmissionInProgress)?;

        let attempt = self.attempts.fetch_add(1, Ordering::AcqRel) + 1;
        self.publish_fresh(SubmissionStatus::begin(attempt, mode, records.len()));

        info!(attempt, mode = ?mode, records = records.len(), "Preparing log submission");
        self.transition(SubmissionState::Preparing);

        let network = contract.session().network();
        let block_number = match network.latest_block_number().await {
            Ok(number) => number,
            Err(e) => return Ok(self.fail(SubmissionFailure::ChainReadError(e.message))),
        };

        let entries = {
            let mut salts = match self.salts.lock() {
                Ok(salts) => salts,
                Err(poisoned) => poisoned.into_inner(),
            };
            prepare_entries(block_number, records, &mut *salts)
        };

        self.transition(SubmissionState::AwaitingSignature);
        let tx_hash = match contract.submit(mode, &entries).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!(attempt, code = e.code, error = %e.message, "Transaction not broadcast");
                return Ok(self.fail(SubmissionFailure::from_send_error(e)));
            }
        };

        info!(attempt, tx_hash = %tx_hash, block_number, "Transaction sent, waiting for confirmation");
        self.transition(SubmissionState::Pending { tx_hash });

        let receipt = match self.await_receipt(network, tx_hash).await {
            Ok(receipt) => receipt,
            Err(failure) => return Ok(self.fail(failure)),
        };

        if !receipt.success {
            return Ok(self.fail(SubmissionFailure::ContractReverted {
                reason: receipt.revert_reason.clone(),
            }));
        }

        let events = contract.decode_events(&receipt);
        info!(
            attempt,
            tx_hash = %tx_hash,
            block = ?receipt.block_number,
            events = events.len(),
            "Log submission confirmed"
        );

        let confirmed = SubmissionState::Confirmed { receipt, events };
        self.transition(confirmed.clone());
        Ok(confirmed)
    }

    async fn await_receipt<P: WalletProvider>(
        &self,
        network: &NetworkHandle<P>,
        tx_hash: B256,
    ) -> Result<Receipt, SubmissionFailure> {
        let wait = network.wait_for_receipt(tx_hash);
        let result = match self.receipt_timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| SubmissionFailure::Timeout(limit))?,
            None => wait.await,
        };
        result.map_err(|e| SubmissionFailure::ChainWaitError(e.message))
    }

    fn fail(&self, failure: SubmissionFailure) -> SubmissionState {
        warn!(category = ?failure.category(), error = %failure, "Log submission failed");
        let failed = SubmissionState::Failed { failure };
        self.transition(failed.clone());
        failed
    }

    fn publish_fresh(&self, status: SubmissionStatus) {
        let snapshot = {
            let mut current = match self.current.lock() {
                Ok(current) => current,
                Err(poisoned) => poisoned.into_inner(),
            };
            *current = status;
            current.clone()
        };
        // No subscribers is fine.
        let _ = self.updates.send(snapshot);
    }

    fn transition(&self, state: SubmissionState) {
        let snapshot = {
            let mut current = match self.current.lock() {
                Ok(current) => current,
                Err(poisoned) => poisoned.into_inner(),
            };
            current.advance(state);
            current.clone()
        };
        tracing::debug!(attempt = snapshot.attempt, state = snapshot.state.name(), "Submission state changed");
        let _ = self.updates.send(snapshot);
    }
}

/// Holds the in-flight flag for the duration of an attempt.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
