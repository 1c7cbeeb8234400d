// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Log Writer
//!
//! One page-instance worth of state: the connected [`Session`] (if any) and
//! the [`SubmissionPipeline`] it feeds. Single entries and batch files go
//! through the same path; the caller's [`SubmissionMode`] picks the contract
//! entry point, so a one-entry batch file is still a batch.
//!
//! The session is only replaced through `&mut self` and never while an
//! attempt is in flight.

use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::broadcast;
use tracing::info;

use crate::batch;
use crate::blockchain::{bind, ContractHandle};
use crate::error::{SubmitError, WriteError};
use crate::pipeline::{
    RandomSalt, SaltSource, SubmissionMode, SubmissionPipeline, SubmissionState, SubmissionStatus,
};
use crate::records::LogRecord;
use crate::wallet::{connect, ConnectError, ProviderHandle, Session, WalletProvider};

pub struct LogWriter<P, S = RandomSalt> {
    session: Option<Session<P>>,
    pipeline: Arc<SubmissionPipeline<S>>,
}

impl<P: WalletProvider, S: SaltSource> LogWriter<P, S> {
    pub fn new(pipeline: SubmissionPipeline<S>) -> Self {
        Self {
            session: None,
            pipeline: Arc::new(pipeline),
        }
    }

    /// Connect to `handle`, replacing any current session.
    pub async fn connect(&mut self, handle: &ProviderHandle<P>) -> Result<Address, ConnectError> {
        if self.pipeline.is_busy() {
            return Err(ConnectError::SubmissionInProgress);
        }
        let session = connect(handle).await?;
        let account = session.account();
        self.session = Some(session);
        Ok(account)
    }

    /// Drop the current session. The pipeline keeps its last status.
    pub fn disconnect(&mut self) -> Result<(), ConnectError> {
        if self.pipeline.is_busy() {
            return Err(ConnectError::SubmissionInProgress);
        }
        if let Some(session) = self.session.take() {
            info!(account = %session.account(), provider = %session.provider_info().name, "Wallet disconnected");
        }
        Ok(())
    }

    pub fn session(&self) -> Option<&Session<P>> {
        self.session.as_ref()
    }

    /// The contract bound to the current session.
    pub fn contract(&self) -> Option<ContractHandle<'_, P>> {
        self.session.as_ref().map(bind)
    }

    /// Submit records as one transaction through `mode`'s entry point.
    pub async fn submit(
        &self,
        mode: SubmissionMode,
        records: &[LogRecord],
    ) -> Result<SubmissionState, SubmitError> {
        let contract = self.contract();
        self.pipeline.submit(contract.as_ref(), mode, records).await
    }

    /// Parse a batch file's contents and submit every entry in one transaction.
    pub async fn submit_batch_file(&self, contents: &str) -> Result<SubmissionState, WriteError> {
        let records = batch::parse(contents)?;
        info!(records = records.len(), "Batch file parsed");
        Ok(self.submit(SubmissionMode::Batch, &records).await?)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SubmissionStatus> {
        self.pipeline.subscribe()
    }

    pub fn status(&self) -> SubmissionStatus {
        self.pipeline.current()
    }

    pub fn pipeline(&self) -> &Arc<SubmissionPipeline<S>> {
        &self.pipeline
    }
}
