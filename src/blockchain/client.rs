// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key-backed wallet provider over HTTP JSON-RPC.
//!
//! [`KeyWallet`] holds a local private key and an alloy HTTP provider, and
//! exposes them through the same [`WalletProvider`] capability a browser
//! wallet would. It never prompts, so it never reports a user rejection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::{
    eips::BlockId,
    network::{Ethereum, EthereumWallet},
    primitives::{Address, B256},
    providers::{
        fillers::{
            BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller,
            WalletFiller,
        },
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::TransportError,
};

use super::types::{NetworkConfig, Receipt};
use crate::wallet::{ProviderInfo, ProviderRpcError, WalletProvider, DISCONNECTED};

/// HTTP provider with all fillers plus the signing wallet.
type SigningProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider<Ethereum>,
>;

/// Display name the key wallet announces itself with.
pub const KEY_WALLET_NAME: &str = "Key Wallet";

/// Wallet provider backed by a local private key.
#[derive(Clone)]
pub struct KeyWallet {
    inner: Arc<KeyWalletInner>,
}

struct KeyWalletInner {
    info: ProviderInfo,
    network: NetworkConfig,
    address: Address,
    provider: SigningProvider,
    poll_interval: Duration,
    /// Requests by hash, kept while their receipt is awaited so reverts can be replayed.
    submitted: Mutex<HashMap<B256, TransactionRequest>>,
}

impl KeyWallet {
    /// Create a wallet for `network` signing with `signer`.
    pub fn new(
        network: NetworkConfig,
        signer: PrivateKeySigner,
        poll_interval: Duration,
    ) -> Result<Self, ChainClientError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainClientError::InvalidRpcUrl(e.to_string()))?;

        let address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url);

        let info = ProviderInfo {
            uuid: uuid::Uuid::new_v4().to_string(),
            name: KEY_WALLET_NAME.to_string(),
            icon: String::new(),
        };

        Ok(Self {
            inner: Arc::new(KeyWalletInner {
                info,
                network,
                address,
                provider,
                poll_interval,
                submitted: Mutex::new(HashMap::new()),
            }),
        })
    }

    pub fn address(&self) -> Address {
        self.inner.address
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.inner.network
    }

    /// Metadata this wallet announces on the discovery bus.
    pub fn provider_info(&self) -> ProviderInfo {
        self.inner.info.clone()
    }

    fn to_receipt(&self, receipt: &TransactionReceipt, revert_reason: Option<String>) -> Receipt {
        Receipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            success: receipt.status(),
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
            revert_reason,
        }
    }

    /// Replay a reverted transaction as a call at its block to recover the reason.
    async fn revert_reason(&self, tx_hash: B256, block_number: Option<u64>) -> Option<String> {
        let tx = self.inner.submitted.lock().ok()?.get(&tx_hash).cloned()?;

        let mut call = self.inner.provider.call(tx);
        if let Some(number) = block_number {
            call = call.block(BlockId::number(number));
        }

        match call.await {
            Ok(_) => None,
            Err(err) if err.as_error_resp().is_some() => rpc_error(err).revert_reason(),
            Err(_) => None,
        }
    }
}

impl WalletProvider for KeyWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderRpcError> {
        Ok(vec![self.inner.address])
    }

    async fn block_number(&self) -> Result<u64, ProviderRpcError> {
        self.inner
            .provider
            .get_block_number()
            .await
            .map_err(rpc_error)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, ProviderRpcError> {
        let pending = self
            .inner
            .provider
            .send_transaction(tx.clone())
            .await
            .map_err(rpc_error)?;

        let tx_hash = *pending.tx_hash();
        if let Ok(mut submitted) = self.inner.submitted.lock() {
            submitted.insert(tx_hash, tx);
        }

        tracing::debug!(
            network = %self.inner.network.name,
            tx_hash = %tx_hash,
            explorer = ?self.inner.network.tx_url(&tx_hash),
            "Transaction broadcast"
        );

        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Receipt, ProviderRpcError> {
        let _forget = ForgetOnDrop {
            submitted: &self.inner.submitted,
            tx_hash,
        };

        loop {
            let receipt = self
                .inner
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(rpc_error)?;

            if let Some(receipt) = receipt {
                let revert_reason = if receipt.status() {
                    None
                } else {
                    self.revert_reason(tx_hash, receipt.block_number).await
                };
                return Ok(self.to_receipt(&receipt, revert_reason));
            }

            tokio::time::sleep(self.inner.poll_interval).await;
        }
    }
}

/// Drops a submitted request when its receipt wait ends, including when the
/// wait errors or is cancelled.
struct ForgetOnDrop<'a> {
    submitted: &'a Mutex<HashMap<B256, TransactionRequest>>,
    tx_hash: B256,
}

impl Drop for ForgetOnDrop<'_> {
    fn drop(&mut self) {
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.remove(&self.tx_hash);
        }
    }
}

/// Map an alloy transport error onto an EIP-1193 style error.
fn rpc_error(err: TransportError) -> ProviderRpcError {
    match err.as_error_resp() {
        Some(payload) => ProviderRpcError::new(payload.code, payload.message.to_string())
            .with_data(payload.as_revert_data()),
        None => ProviderRpcError::new(DISCONNECTED, err.to_string()),
    }
}

/// Errors that can occur while setting up the chain client.
#[derive(Debug, thiserror::Error)]
pub enum ChainClientError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),
}
