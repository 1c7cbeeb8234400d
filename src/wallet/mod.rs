// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet provider discovery and connection.
//!
//! This module provides functionality for:
//! - Discovering wallet providers announced on the bus
//! - Requesting account access and opening a signing session

pub mod connection;
pub mod discovery;
pub mod provider;

pub use connection::{connect, ConnectError, NetworkHandle, Session, SigningHandle, ACCOUNT_INDEX};
pub use discovery::{serve_announcements, AnnouncementBus, BusSignal, ProviderDiscovery};
pub use provider::*;
