// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use alloy::primitives::{address, Address, Log, B256};
use serde::Serialize;

/// Deployed LogEmitter contract.
pub const LOG_EMITTER_ADDRESS: Address = address!("54da4e13992cf3ab86a09c39230a27257214f99d");

/// EVM network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: String,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Block explorer URL
    pub explorer_url: Option<String>,
}

impl NetworkConfig {
    /// A local development node (anvil / hardhat).
    pub fn local() -> Self {
        Self {
            name: "Local Devnet".to_string(),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            explorer_url: None,
        }
    }

    /// Explorer link for a transaction, when the network has an explorer.
    pub fn tx_url(&self, tx_hash: &B256) -> Option<String> {
        self.explorer_url
            .as_ref()
            .map(|base| format!("{}/tx/{:#x}", base.trim_end_matches('/'), tx_hash))
    }
}

/// Transaction receipt after inclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    /// Transaction hash
    pub tx_hash: B256,
    /// Block number where transaction was included
    pub block_number: Option<u64>,
    /// Gas actually used
    pub gas_used: u64,
    /// Whether execution succeeded (status == 1)
    pub success: bool,
    /// Raw log entries emitted during execution
    #[serde(skip)]
    pub logs: Vec<Log>,
    /// Revert reason, when the transaction reverted and the reason could be decoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
}
