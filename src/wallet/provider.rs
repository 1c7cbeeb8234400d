// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet provider capability.
//!
//! A wallet provider is whatever the environment hands us to request
//! accounts, read the chain and sign transactions: a browser extension
//! speaking EIP-1193, or the in-process key-backed wallet in
//! [`crate::blockchain::client`]. The pipeline only ever talks to this trait.

use std::future::Future;

use alloy::{
    primitives::{Address, Bytes, B256},
    rpc::types::TransactionRequest,
    sol_types::decode_revert_reason,
};
use serde::{Deserialize, Serialize};

use crate::blockchain::Receipt;

/// EIP-1193 error code for "user rejected the request".
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// EIP-1193 error code for "the requested method/account is not authorized".
pub const UNAUTHORIZED: i64 = 4100;

/// EIP-1193 error code for "provider is disconnected from all chains".
pub const DISCONNECTED: i64 = 4900;

/// JSON-RPC error code nodes use when a call or gas estimate reverts.
pub const EXECUTION_REVERTED: i64 = 3;

/// JSON-RPC internal error.
pub const INTERNAL_ERROR: i64 = -32603;

/// Metadata a provider announces about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Unique id of this provider instance (registry key).
    pub uuid: String,
    /// Display name, e.g. "MetaMask"
    pub name: String,
    /// Icon reference (usually a data URI)
    pub icon: String,
}

/// Provider metadata paired with the capability used to talk to it.
#[derive(Debug, Clone)]
pub struct ProviderHandle<P> {
    pub info: ProviderInfo,
    pub provider: P,
}

/// Error reported by a wallet provider, shaped like an EIP-1193 `ProviderRpcError`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
    /// Revert data returned with the error, if any.
    pub data: Option<Bytes>,
}

impl ProviderRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Option<Bytes>) -> Self {
        self.data = data;
        self
    }

    pub fn user_rejected(message: impl Into<String>) -> Self {
        Self::new(USER_REJECTED_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    /// Whether the user declined the request in the wallet UI.
    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED_REQUEST
    }

    /// Whether the node refused because the contract call reverted, e.g.
    /// during gas estimation before anything was broadcast.
    pub fn is_revert(&self) -> bool {
        self.code == EXECUTION_REVERTED
            || self.data.is_some()
            || self.message.trim_start().starts_with("execution reverted")
    }

    /// Revert reason from the revert data, else from the error message.
    pub fn revert_reason(&self) -> Option<String> {
        let decoded = self
            .data
            .as_ref()
            .and_then(|data| decode_revert_reason(data))
            .map(|reason| match reason.strip_prefix("revert: ") {
                Some(stripped) => stripped.to_string(),
                None => reason,
            });

        decoded.or_else(|| {
            let message = self.message.trim();
            let reason = message
                .strip_prefix("execution reverted")
                .unwrap_or(message)
                .trim_start_matches(':')
                .trim();
            (!reason.is_empty()).then(|| reason.to_string())
        })
    }
}

/// Capability object exposed by a wallet provider.
///
/// Every method is a suspension point; implementations must not block the
/// runtime. `send_transaction` resolves once the wallet has signed and
/// broadcast the transaction, `transaction_receipt` once it has been mined.
pub trait WalletProvider: Clone + Send + Sync + 'static {
    /// Ask the wallet for account access (`eth_requestAccounts`).
    fn request_accounts(
        &self,
    ) -> impl Future<Output = Result<Vec<Address>, ProviderRpcError>> + Send;

    /// Latest block number (`eth_blockNumber`).
    fn block_number(&self) -> impl Future<Output = Result<u64, ProviderRpcError>> + Send;

    /// Sign and broadcast a transaction (`eth_sendTransaction`), returning its hash.
    fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> impl Future<Output = Result<B256, ProviderRpcError>> + Send;

    /// Wait until the transaction is mined and return its receipt.
    fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> impl Future<Output = Result<Receipt, ProviderRpcError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_rejection_is_detected_by_code() {
        let err = ProviderRpcError::user_rejected("User denied transaction signature.");
        assert!(err.is_user_rejection());
        assert_eq!(
            err.to_string(),
            "User denied transaction signature. (code 4001)"
        );

        let other = ProviderRpcError::new(DISCONNECTED, "disconnected");
        assert!(!other.is_user_rejection());
    }

    #[test]
    fn execution_reverted_code_carries_reason_in_message() {
        let err = ProviderRpcError::new(
            EXECUTION_REVERTED,
            "execution reverted: LogEmitter: duplicate id",
        );
        assert!(err.is_revert());
        assert_eq!(err.revert_reason().as_deref(), Some("LogEmitter: duplicate id"));

        let bare = ProviderRpcError::new(EXECUTION_REVERTED, "execution reverted");
        assert!(bare.is_revert());
        assert_eq!(bare.revert_reason(), None);
    }

    #[test]
    fn revert_data_is_decoded_before_the_message() {
        use alloy::sol_types::{Revert, SolError};

        let data = Revert {
            reason: "LogEmitter: duplicate id".to_string(),
        }
        .abi_encode();
        let err = ProviderRpcError::new(-32000, "execution reverted")
            .with_data(Some(Bytes::from(data)));
        assert!(err.is_revert());
        assert_eq!(err.revert_reason().as_deref(), Some("LogEmitter: duplicate id"));
    }

    #[test]
    fn ordinary_wallet_errors_are_not_reverts() {
        assert!(!ProviderRpcError::internal("insufficient funds for gas").is_revert());
        assert!(!ProviderRpcError::user_rejected("User denied").is_revert());
    }
}
