// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RPC_URL` | JSON-RPC endpoint of the target chain | `http://127.0.0.1:8545` |
//! | `CHAIN_NAME` | Network name shown in logs | `Local Devnet` |
//! | `EXPLORER_URL` | Block explorer base URL for transaction links | None |
//! | `WALLET_PRIVATE_KEY` | Hex secp256k1 key for the key wallet | Optional |
//! | `WALLET_KEY_PEM` | Path to a PKCS#8 PEM key (used if no hex key) | Optional |
//! | `RECEIPT_TIMEOUT_SECS` | Receipt wait limit, `0` waits forever | `300` |
//! | `RECEIPT_POLL_INTERVAL_MS` | Receipt polling interval | `1000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::signing::{signer_from_hex, signer_from_pem_file, SigningError};
use crate::blockchain::NetworkConfig;

/// Environment variable name for the chain's JSON-RPC endpoint.
pub const RPC_URL_ENV: &str = "RPC_URL";

/// Environment variable name for the network display name.
pub const CHAIN_NAME_ENV: &str = "CHAIN_NAME";

/// Environment variable name for the block explorer base URL.
pub const EXPLORER_URL_ENV: &str = "EXPLORER_URL";

/// Environment variable name for a hex-encoded signing key.
///
/// Takes precedence over [`WALLET_KEY_PEM_ENV`] when both are set.
pub const WALLET_PRIVATE_KEY_ENV: &str = "WALLET_PRIVATE_KEY";

/// Environment variable name for a PEM signing key file.
pub const WALLET_KEY_PEM_ENV: &str = "WALLET_KEY_PEM";

/// Environment variable name for the receipt wait limit in seconds.
pub const RECEIPT_TIMEOUT_ENV: &str = "RECEIPT_TIMEOUT_SECS";

/// Environment variable name for the receipt polling interval in milliseconds.
pub const RECEIPT_POLL_INTERVAL_ENV: &str = "RECEIPT_POLL_INTERVAL_MS";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 1_000;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Where the key wallet's signing key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
    Hex(String),
    PemFile(PathBuf),
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Hex(_) => f.write_str("Hex(<redacted>)"),
            KeySource::PemFile(path) => f.debug_tuple("PemFile").field(path).finish(),
        }
    }
}

impl KeySource {
    /// Load the signer this source points at.
    pub fn signer(&self) -> Result<PrivateKeySigner, SigningError> {
        match self {
            KeySource::Hex(hex) => signer_from_hex(hex),
            KeySource::PemFile(path) => signer_from_pem_file(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub network: NetworkConfig,
    /// Signing key for the key wallet, if one is configured.
    pub key: Option<KeySource>,
    /// `None` waits for receipts indefinitely.
    pub receipt_timeout: Option<Duration>,
    pub receipt_poll_interval: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to read variables. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let defaults = NetworkConfig::local();
        let network = NetworkConfig {
            name: get(CHAIN_NAME_ENV).unwrap_or(defaults.name),
            rpc_url: get(RPC_URL_ENV).unwrap_or(defaults.rpc_url),
            explorer_url: get(EXPLORER_URL_ENV),
        };

        let key = get(WALLET_PRIVATE_KEY_ENV)
            .map(KeySource::Hex)
            .or_else(|| get(WALLET_KEY_PEM_ENV).map(|p| KeySource::PemFile(PathBuf::from(p))));

        let timeout_secs = parse_u64(RECEIPT_TIMEOUT_ENV, get(RECEIPT_TIMEOUT_ENV))?
            .unwrap_or(DEFAULT_RECEIPT_TIMEOUT_SECS);
        let receipt_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let poll_ms = parse_u64(RECEIPT_POLL_INTERVAL_ENV, get(RECEIPT_POLL_INTERVAL_ENV))?
            .unwrap_or(DEFAULT_RECEIPT_POLL_INTERVAL_MS)
            .max(1);

        let log_format = match get(LOG_FORMAT_ENV).map(|v| v.to_ascii_lowercase()) {
            None => LogFormat::default(),
            Some(v) if v == "json" => LogFormat::Json,
            Some(v) if v == "pretty" => LogFormat::Pretty,
            Some(v) => {
                return Err(ConfigError::InvalidValue {
                    name: LOG_FORMAT_ENV,
                    value: v,
                    reason: "expected `json` or `pretty`".to_string(),
                })
            }
        };

        Ok(Self {
            network,
            key,
            receipt_timeout,
            receipt_poll_interval: Duration::from_millis(poll_ms),
            log_format,
        })
    }
}

fn parse_u64(name: &'static str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    value
        .map(|v| {
            v.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                name,
                value: v.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}
