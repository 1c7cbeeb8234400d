// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signer loading for the key-backed wallet.
//!
//! Keys come either as a hex string (as exported by most wallets and dev
//! nodes) or as a PEM file (SEC1 or PKCS#8 secp256k1).

use std::path::Path;

use alloy::signers::local::PrivateKeySigner;
use k256::SecretKey;

/// Errors that can occur while loading a signing key.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Failed to read key file {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Create a signer from a hex private key, with or without `0x`.
pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner, SigningError> {
    let trimmed = private_key_hex.trim();
    let key_bytes = alloy::hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))
}

/// Parse a PEM-encoded secp256k1 private key to a hex string (no `0x`).
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, SigningError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid UTF-8: {}", e)))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid PEM: {}", e)))?;

    // SEC1 first, then PKCS#8
    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| {
            use k256::pkcs8::DecodePrivateKey;
            SecretKey::from_pkcs8_der(pem.contents())
        })
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid key format: {}", e)))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

/// Create a signer from PEM-encoded private key bytes.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, SigningError> {
    signer_from_hex(&pem_to_hex(pem_bytes)?)
}

/// Read a PEM key file and create a signer from it.
pub fn signer_from_pem_file(path: &Path) -> Result<PrivateKeySigner, SigningError> {
    let bytes = std::fs::read(path).map_err(|e| SigningError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    signer_from_pem(&bytes)
}
