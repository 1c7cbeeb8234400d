// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM integration for the LogEmitter contract.
//!
//! This module provides functionality for:
//! - Binding the LogEmitter contract to a session and decoding its events
//! - A key-backed wallet provider over HTTP JSON-RPC
//! - Loading signing keys from hex or PEM

pub mod client;
pub mod contract;
pub mod signing;
pub mod types;

pub use client::{ChainClientError, KeyWallet};
pub use contract::{bind, decode_events, ContractHandle, DecodedEvent, LogEmitter};
pub use types::*;
