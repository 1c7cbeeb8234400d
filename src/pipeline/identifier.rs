// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-entry log identifiers.
//!
//! `id = keccak256("{block}-{seed}-{salt}")` where `block` is the latest
//! block number read at submission time, `seed` is the record's raw time
//! input and `salt` is drawn independently per record from
//! `[SALT_MIN, SALT_MAX]`. Nothing checks identifiers for uniqueness
//! on-chain; two records only collide if block, seed and salt all match.

use std::fmt;

use alloy::primitives::{keccak256, B256};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::records::LogRecord;

pub const SALT_MIN: u32 = 1;
pub const SALT_MAX: u32 = 1_000_000;

/// A `bytes32` log identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LogIdentifier(pub B256);

impl LogIdentifier {
    pub fn derive(block_number: u64, seed: &str, salt: u32) -> Self {
        Self(keccak256(format!("{block_number}-{seed}-{salt}").as_bytes()))
    }
}

impl From<LogIdentifier> for B256 {
    fn from(id: LogIdentifier) -> Self {
        id.0
    }
}

impl fmt::Display for LogIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of identifier salts.
pub trait SaltSource: Send {
    /// Draw a salt in `[SALT_MIN, SALT_MAX]`.
    fn draw(&mut self) -> u32;
}

/// Uniformly random salts.
pub struct RandomSalt {
    rng: StdRng,
}

impl Default for RandomSalt {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl SaltSource for RandomSalt {
    fn draw(&mut self) -> u32 {
        self.rng.gen_range(SALT_MIN..=SALT_MAX)
    }
}

impl<F: FnMut() -> u32 + Send> SaltSource for F {
    fn draw(&mut self) -> u32 {
        self()
    }
}

/// A record with its identifier derived and its timestamp normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedEntry {
    pub id: LogIdentifier,
    pub salt: u32,
    /// Unsigned epoch seconds.
    pub timestamp: u64,
    pub server_id: u64,
    pub message: String,
}

/// Derive identifiers for `records`, drawing a fresh salt for each one.
pub fn prepare_entries<S: SaltSource + ?Sized>(
    block_number: u64,
    records: &[LogRecord],
    salts: &mut S,
) -> Vec<PreparedEntry> {
    records
        .iter()
        .map(|record| {
            let salt = salts.draw();
            PreparedEntry {
                id: LogIdentifier::derive(block_number, &record.id_seed, salt),
                salt,
                timestamp: u64::try_from(record.timestamp).unwrap_or_default(),
                server_id: record.server_id,
                message: record.message.clone(),
            }
        })
        .collect()
}
