// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! chainlog - On-chain Log Writer
//!
//! Discovers wallet providers, connects a signing account and writes log
//! records to the LogEmitter contract, one record per `emitLog` call or many
//! per `emitLogsBatch` call.
//!
//! ## Modules
//!
//! - `wallet` - Provider discovery, capability trait and connection
//! - `blockchain` - LogEmitter binding, key-backed wallet, signing keys
//! - `records` - Log records and time input parsing
//! - `batch` - JSON batch file adapter
//! - `pipeline` - Submission state machine
//! - `writer` - Session plus pipeline, as used by the CLI
//! - `status` - Status lines for display
//! - `config` - Environment configuration

pub mod batch;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod records;
pub mod status;
pub mod wallet;
pub mod writer;

#[cfg(test)]
mod testing;
