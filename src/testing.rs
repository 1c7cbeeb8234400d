// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scripted wallet provider for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::{
    primitives::{address, Address, Log, TxKind, B256},
    rpc::types::TransactionRequest,
    sol_types::{SolEvent, SolInterface},
};
use tokio::sync::{broadcast, Notify};

use crate::blockchain::{LogEmitter, Receipt};
use crate::pipeline::SubmissionStatus;
use crate::wallet::{ProviderHandle, ProviderInfo, ProviderRpcError, WalletProvider};

pub const ALICE: Address = address!("abc0000000000000000000000000000000000001");
pub const BOB: Address = address!("b0b0000000000000000000000000000000000002");

#[derive(Debug, Clone)]
enum ReceiptScript {
    /// Successful receipt echoing one `LogEmitted` per submitted entry.
    Echo,
    Revert(Option<String>),
    Fail(String),
}

struct MockState {
    accounts: Mutex<Result<Vec<Address>, ProviderRpcError>>,
    block: Mutex<Result<u64, ProviderRpcError>>,
    send: Mutex<Result<B256, ProviderRpcError>>,
    receipt: Mutex<ReceiptScript>,
    gate: Mutex<Option<Arc<Notify>>>,
    sent: Mutex<Vec<TransactionRequest>>,
    block_reads: AtomicUsize,
}

/// Wallet whose every answer is scripted up front.
#[derive(Clone)]
pub struct MockWallet {
    state: Arc<MockState>,
}

impl std::fmt::Debug for MockWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockWallet").finish_non_exhaustive()
    }
}

impl MockWallet {
    /// Accounts `[ALICE]`, block 42, broadcast hash `0xdeadbeef`, echoing receipt.
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState {
                accounts: Mutex::new(Ok(vec![ALICE])),
                block: Mutex::new(Ok(42)),
                send: Mutex::new(Ok(Self::tx_hash())),
                receipt: Mutex::new(ReceiptScript::Echo),
                gate: Mutex::new(None),
                sent: Mutex::new(Vec::new()),
                block_reads: AtomicUsize::new(0),
            }),
        }
    }

    pub fn tx_hash() -> B256 {
        B256::left_padding_from(&[0xde, 0xad, 0xbe, 0xef])
    }

    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        *self.state.accounts.lock().unwrap() = Ok(accounts);
        self
    }

    pub fn rejecting_accounts(self, message: &str) -> Self {
        *self.state.accounts.lock().unwrap() = Err(ProviderRpcError::user_rejected(message));
        self
    }

    pub fn failing_accounts(self, err: ProviderRpcError) -> Self {
        *self.state.accounts.lock().unwrap() = Err(err);
        self
    }

    pub fn with_block(self, number: u64) -> Self {
        self.set_block(number);
        self
    }

    pub fn failing_block_read(self, message: &str) -> Self {
        *self.state.block.lock().unwrap() = Err(ProviderRpcError::internal(message));
        self
    }

    pub fn rejecting_send(self, err: ProviderRpcError) -> Self {
        self.set_send_result(Err(err));
        self
    }

    pub fn reverting(self, reason: Option<&str>) -> Self {
        *self.state.receipt.lock().unwrap() = ReceiptScript::Revert(reason.map(str::to_string));
        self
    }

    pub fn failing_receipt(self, message: &str) -> Self {
        *self.state.receipt.lock().unwrap() = ReceiptScript::Fail(message.to_string());
        self
    }

    /// Receipt waits block until [`MockWallet::release_receipt`].
    pub fn holding_receipt(self) -> Self {
        *self.state.gate.lock().unwrap() = Some(Arc::new(Notify::new()));
        self
    }

    pub fn release_receipt(&self) {
        if let Some(gate) = self.state.gate.lock().unwrap().as_ref() {
            gate.notify_one();
        }
    }

    pub fn set_block(&self, number: u64) {
        *self.state.block.lock().unwrap() = Ok(number);
    }

    pub fn set_send_result(&self, result: Result<B256, ProviderRpcError>) {
        *self.state.send.lock().unwrap() = result;
    }

    /// Transactions successfully broadcast so far.
    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.state.sent.lock().unwrap().clone()
    }

    pub fn block_reads(&self) -> usize {
        self.state.block_reads.load(Ordering::SeqCst)
    }

    fn receipt(&self, tx_hash: B256, success: bool, logs: Vec<Log>, revert_reason: Option<String>) -> Receipt {
        let block = self.state.block.lock().unwrap().clone().unwrap_or_default();
        Receipt {
            tx_hash,
            block_number: Some(block + 1),
            gas_used: 48_000,
            success,
            logs,
            revert_reason,
        }
    }
}

impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderRpcError> {
        self.state.accounts.lock().unwrap().clone()
    }

    async fn block_number(&self) -> Result<u64, ProviderRpcError> {
        self.state.block_reads.fetch_add(1, Ordering::SeqCst);
        self.state.block.lock().unwrap().clone()
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, ProviderRpcError> {
        let result = self.state.send.lock().unwrap().clone();
        if result.is_ok() {
            self.state.sent.lock().unwrap().push(tx);
        }
        result
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Receipt, ProviderRpcError> {
        let gate = self.state.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let script = self.state.receipt.lock().unwrap().clone();
        match script {
            ReceiptScript::Echo => {
                let logs = self
                    .state
                    .sent
                    .lock()
                    .unwrap()
                    .last()
                    .map(echo_logs)
                    .unwrap_or_default();
                Ok(self.receipt(tx_hash, true, logs, None))
            }
            ReceiptScript::Revert(reason) => Ok(self.receipt(tx_hash, false, Vec::new(), reason)),
            ReceiptScript::Fail(message) => Err(ProviderRpcError::internal(message)),
        }
    }
}

/// The `LogEmitted` logs the contract would emit for `tx`.
pub fn echo_logs(tx: &TransactionRequest) -> Vec<Log> {
    let Some(TxKind::Call(to)) = tx.to else {
        return Vec::new();
    };
    let Some(input) = tx.input.input() else {
        return Vec::new();
    };

    let events: Vec<LogEmitter::LogEmitted> = match LogEmitter::LogEmitterCalls::abi_decode(input) {
        Ok(LogEmitter::LogEmitterCalls::emitLog(call)) => vec![LogEmitter::LogEmitted {
            logId: call.logId,
            timestamp: call.timestamp,
            serverId: call.serverId,
            message: call.message,
        }],
        Ok(LogEmitter::LogEmitterCalls::emitLogsBatch(call)) => (0..call.logIds.len())
            .map(|i| LogEmitter::LogEmitted {
                logId: call.logIds[i],
                timestamp: call.timestamps[i],
                serverId: call.serverIds[i],
                message: call.messages[i].clone(),
            })
            .collect(),
        Err(_) => Vec::new(),
    };

    events
        .into_iter()
        .map(|event| Log {
            address: to,
            data: event.encode_log_data(),
        })
        .collect()
}

pub fn alpha_info() -> ProviderInfo {
    ProviderInfo {
        uuid: "6a1c1ff3-1b4e-4b7a-9d2e-7f3b0a6c9e11".to_string(),
        name: "Alpha Wallet".to_string(),
        icon: "data:image/svg+xml;base64,PHN2Zy8+".to_string(),
    }
}

pub fn alpha_handle(wallet: MockWallet) -> ProviderHandle<MockWallet> {
    ProviderHandle {
        info: alpha_info(),
        provider: wallet,
    }
}

/// Everything published so far, without waiting.
pub fn drain(rx: &mut broadcast::Receiver<SubmissionStatus>) -> Vec<SubmissionStatus> {
    let mut out = Vec::new();
    while let Ok(status) = rx.try_recv() {
        out.push(status);
    }
    out
}
