// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LogEmitter contract binding.

use alloy::{
    primitives::{Address, Log, B256, U256},
    rpc::types::TransactionRequest,
    sol,
    sol_types::{SolCall, SolEventInterface},
};
use serde::Serialize;

use super::types::{Receipt, LOG_EMITTER_ADDRESS};
use crate::pipeline::{PreparedEntry, SubmissionMode};
use crate::wallet::{ProviderRpcError, Session, WalletProvider};

// Must match the deployed contract's ABI exactly.
sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface LogEmitter {
        event LogEmitted(bytes32 indexed logId, uint256 timestamp, uint256 serverId, string message);

        function emitLog(bytes32 logId, uint256 timestamp, uint256 serverId, string message) external;
        function emitLogsBatch(
            bytes32[] logIds,
            uint256[] timestamps,
            uint256[] serverIds,
            string[] messages
        ) external;
    }
}

/// An event decoded from a receipt log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedEvent {
    pub name: String,
    pub args: serde_json::Value,
}

impl From<LogEmitter::LogEmitterEvents> for DecodedEvent {
    fn from(event: LogEmitter::LogEmitterEvents) -> Self {
        match event {
            LogEmitter::LogEmitterEvents::LogEmitted(e) => DecodedEvent {
                name: "LogEmitted".to_string(),
                args: serde_json::json!({
                    "logId": e.logId.to_string(),
                    "timestamp": e.timestamp.to_string(),
                    "serverId": e.serverId.to_string(),
                    "message": e.message,
                }),
            },
        }
    }
}

/// LogEmitter instance bound to a session's signer.
///
/// Borrows the [`Session`], so a handle can never outlive (or sign for) a
/// session that has been replaced.
pub struct ContractHandle<'s, P> {
    address: Address,
    session: &'s Session<P>,
}

/// Bind the LogEmitter contract to `session`. No network access.
pub fn bind<P: WalletProvider>(session: &Session<P>) -> ContractHandle<'_, P> {
    ContractHandle {
        address: LOG_EMITTER_ADDRESS,
        session,
    }
}

impl<'s, P: WalletProvider> ContractHandle<'s, P> {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn session(&self) -> &'s Session<P> {
        self.session
    }

    /// `emitLog(id, timestamp, serverId, message)` for one entry.
    pub fn emit_log_request(&self, entry: &PreparedEntry) -> TransactionRequest {
        let call = LogEmitter::emitLogCall {
            logId: entry.id.into(),
            timestamp: U256::from(entry.timestamp),
            serverId: U256::from(entry.server_id),
            message: entry.message.clone(),
        };
        self.request(call.abi_encode())
    }

    /// `emitLogsBatch(ids[], timestamps[], serverIds[], messages[])`, index-aligned with `entries`.
    pub fn emit_logs_batch_request(&self, entries: &[PreparedEntry]) -> TransactionRequest {
        let call = LogEmitter::emitLogsBatchCall {
            logIds: entries.iter().map(|e| B256::from(e.id)).collect(),
            timestamps: entries.iter().map(|e| U256::from(e.timestamp)).collect(),
            serverIds: entries.iter().map(|e| U256::from(e.server_id)).collect(),
            messages: entries.iter().map(|e| e.message.clone()).collect(),
        };
        self.request(call.abi_encode())
    }

    /// Submit entries through the signer using `mode`'s entry point.
    /// Resolves once broadcast.
    pub async fn submit(
        &self,
        mode: SubmissionMode,
        entries: &[PreparedEntry],
    ) -> Result<B256, ProviderRpcError> {
        let tx = match (mode, entries) {
            (SubmissionMode::Single, [entry]) => self.emit_log_request(entry),
            (SubmissionMode::Single, _) => {
                return Err(ProviderRpcError::internal(format!(
                    "emitLog takes exactly one entry, got {}",
                    entries.len()
                )))
            }
            (SubmissionMode::Batch, _) => self.emit_logs_batch_request(entries),
        };
        self.session.signer().send_transaction(tx).await
    }

    /// Decode the receipt's events emitted by this contract.
    pub fn decode_events(&self, receipt: &Receipt) -> Vec<DecodedEvent> {
        decode_events(self.address, &receipt.logs)
    }

    fn request(&self, input: Vec<u8>) -> TransactionRequest {
        TransactionRequest::default()
            .to(self.address)
            .input(input.into())
    }
}

/// Decode the entries of `logs` emitted by `contract`.
///
/// Entries from other addresses are ignored; entries that fail to decode are
/// dropped with a warning.
pub fn decode_events(contract: Address, logs: &[Log]) -> Vec<DecodedEvent> {
    // Address equality is byte-wise, so hex casing never matters here.
    logs.iter()
        .filter(|log| log.address == contract)
        .filter_map(|log| match LogEmitter::LogEmitterEvents::decode_log(log) {
            Ok(decoded) => Some(DecodedEvent::from(decoded.data)),
            Err(e) => {
                tracing::warn!(
                    contract = %contract,
                    topics = log.topics().len(),
                    error = %e,
                    "Could not decode receipt log"
                );
                None
            }
        })
        .collect()
}
