// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Connection Manager
//!
//! Turns a user-selected [`ProviderHandle`] into a [`Session`]: one
//! `eth_requestAccounts` round trip, then a signing handle and a network
//! handle bound to the returned account.

use alloy::{
    primitives::{Address, B256},
    rpc::types::TransactionRequest,
};
use tracing::{info, warn};

use super::provider::{ProviderHandle, ProviderInfo, ProviderRpcError, WalletProvider};
use crate::blockchain::Receipt;

/// Which of the returned accounts a session binds to.
///
/// Multi-account selection is not supported; the wallet's first (currently
/// selected) account is always used.
pub const ACCOUNT_INDEX: usize = 0;

/// Signing capability bound to one account of one provider.
#[derive(Debug, Clone)]
pub struct SigningHandle<P> {
    provider: P,
    account: Address,
}

impl<P: WalletProvider> SigningHandle<P> {
    pub fn account(&self) -> Address {
        self.account
    }

    /// Ask the wallet to sign and broadcast `tx` from the bound account.
    pub async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, ProviderRpcError> {
        self.provider.send_transaction(tx.from(self.account)).await
    }
}

/// Read-only chain access through the provider.
#[derive(Debug, Clone)]
pub struct NetworkHandle<P> {
    provider: P,
}

impl<P: WalletProvider> NetworkHandle<P> {
    pub async fn latest_block_number(&self) -> Result<u64, ProviderRpcError> {
        self.provider.block_number().await
    }

    pub async fn wait_for_receipt(&self, tx_hash: B256) -> Result<Receipt, ProviderRpcError> {
        self.provider.transaction_receipt(tx_hash).await
    }
}

/// Connected account with its signing and network capabilities.
#[derive(Debug, Clone)]
pub struct Session<P> {
    info: ProviderInfo,
    account: Address,
    signer: SigningHandle<P>,
    network: NetworkHandle<P>,
}

impl<P: WalletProvider> Session<P> {
    pub fn account(&self) -> Address {
        self.account
    }

    /// The provider this session was opened against.
    pub fn provider_info(&self) -> &ProviderInfo {
        &self.info
    }

    pub fn signer(&self) -> &SigningHandle<P> {
        &self.signer
    }

    pub fn network(&self) -> &NetworkHandle<P> {
        &self.network
    }
}

/// Errors that can occur while connecting to a wallet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("Connection request rejected by user: {0}")]
    UserRejected(String),

    #[error("Wallet returned no accounts")]
    NoAccountsReturned,

    #[error("Wallet provider error: {0}")]
    ProviderError(ProviderRpcError),

    #[error("A submission is in progress; wait for it to finish before changing wallets")]
    SubmissionInProgress,
}

/// Request account access from `handle` and open a session on its first account.
///
/// Concurrent calls against the same handle are not deduplicated; callers
/// serialize them (e.g. disable the connect control while one is outstanding).
pub async fn connect<P: WalletProvider>(handle: &ProviderHandle<P>) -> Result<Session<P>, ConnectError> {
    let accounts = handle
        .provider
        .request_accounts()
        .await
        .map_err(|e| {
            warn!(provider = %handle.info.name, error = %e, "Account request failed");
            if e.is_user_rejection() {
                ConnectError::UserRejected(e.message)
            } else {
                ConnectError::ProviderError(e)
            }
        })?;

    let account = *accounts
        .get(ACCOUNT_INDEX)
        .ok_or(ConnectError::NoAccountsReturned)?;

    info!(
        provider = %handle.info.name,
        %account,
        available = accounts.len(),
        "Wallet connected"
    );

    Ok(Session {
        info: handle.info.clone(),
        account,
        signer: SigningHandle {
            provider: handle.provider.clone(),
            account,
        },
        network: NetworkHandle {
            provider: handle.provider.clone(),
        },
    })
}
