// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Provider Discovery
//!
//! Wallets announce themselves asynchronously on an [`AnnouncementBus`]
//! (the EIP-6963 `announceProvider` / `requestProvider` handshake, with the
//! transport injected instead of hanging off a global event target).
//!
//! [`ProviderDiscovery`] owns an explicit listener lifecycle:
//!
//! 1. `start()` subscribes to the bus, spawns the listener task, then asks
//!    every wallet to (re-)announce so providers that loaded earlier show up.
//! 2. Each announcement whose `uuid` is new is appended to the registry and
//!    subscribers receive the updated list.
//! 3. `stop()` cancels the listener. The registry survives; `start()` may be
//!    called again.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::provider::{ProviderHandle, ProviderInfo};

/// Buffered signals per bus subscriber before it starts lagging.
const BUS_CAPACITY: usize = 64;

/// A signal travelling on the announcement bus.
#[derive(Clone)]
pub enum BusSignal<P> {
    /// A wallet announcing itself.
    Announce(ProviderHandle<P>),
    /// A dapp asking every wallet to announce itself again.
    RequestProviders,
}

/// Broadcast transport shared by wallets and dapps.
#[derive(Clone)]
pub struct AnnouncementBus<P> {
    tx: broadcast::Sender<BusSignal<P>>,
}

impl<P: Clone + Send + 'static> AnnouncementBus<P> {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Announce a provider. Nobody listening is not an error.
    pub fn announce(&self, info: ProviderInfo, provider: P) {
        let _ = self
            .tx
            .send(BusSignal::Announce(ProviderHandle { info, provider }));
    }

    /// Ask all wallets to announce themselves again.
    pub fn request_providers(&self) {
        let _ = self.tx.send(BusSignal::RequestProviders);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusSignal<P>> {
        self.tx.subscribe()
    }
}

impl<P: Clone + Send + 'static> Default for AnnouncementBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Wallet side of the handshake: announce once, then again on every request.
///
/// Should be spawned for the lifetime of the wallet:
/// ```rust,ignore
/// let task = serve_announcements(bus.clone(), info, wallet, shutdown.clone());
/// ```
pub fn serve_announcements<P: Clone + Send + Sync + 'static>(
    bus: AnnouncementBus<P>,
    info: ProviderInfo,
    provider: P,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    bus.announce(info.clone(), provider.clone());

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                signal = rx.recv() => match signal {
                    Ok(BusSignal::RequestProviders) => {
                        bus.announce(info.clone(), provider.clone());
                    }
                    Ok(BusSignal::Announce(_)) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        }
    })
}

/// De-duplicated registry of announced wallet providers.
pub struct ProviderDiscovery<P> {
    bus: AnnouncementBus<P>,
    registry: Arc<watch::Sender<Vec<ProviderHandle<P>>>>,
    listener: Option<CancellationToken>,
}

impl<P: Clone + Send + Sync + 'static> ProviderDiscovery<P> {
    pub fn new(bus: AnnouncementBus<P>) -> Self {
        let (registry, _) = watch::channel(Vec::new());
        Self {
            bus,
            registry: Arc::new(registry),
            listener: None,
        }
    }

    /// Start listening for announcements. Calling it twice is a no-op.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) {
        if self.listener.is_some() {
            return;
        }

        // Subscribe before requesting so no re-announcement is missed.
        let mut rx = self.bus.subscribe();
        let token = CancellationToken::new();
        let shutdown = token.clone();
        let registry = Arc::clone(&self.registry);

        tokio::spawn(async move {
            debug!("Provider discovery listener started");
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    signal = rx.recv() => match signal {
                        Ok(BusSignal::Announce(handle)) => {
                            register(&registry, handle);
                        }
                        Ok(BusSignal::RequestProviders) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Provider discovery lagged behind announcements");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
            debug!("Provider discovery listener stopped");
        });

        self.bus.request_providers();
        self.listener = Some(token);
    }

    /// Release the listener. The registry is kept.
    pub fn stop(&mut self) {
        if let Some(token) = self.listener.take() {
            token.cancel();
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Snapshot of the registry in discovery order.
    pub fn list(&self) -> Vec<ProviderHandle<P>> {
        self.registry.borrow().clone()
    }

    /// Receive the updated list after every new registration.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ProviderHandle<P>>> {
        self.registry.subscribe()
    }

    /// Look a provider up by uuid or (case-insensitive) display name.
    pub fn find(&self, key: &str) -> Option<ProviderHandle<P>> {
        self.registry
            .borrow()
            .iter()
            .find(|h| h.info.uuid == key || h.info.name.eq_ignore_ascii_case(key))
            .cloned()
    }
}

impl<P> Drop for ProviderDiscovery<P> {
    fn drop(&mut self) {
        if let Some(token) = self.listener.take() {
            token.cancel();
        }
    }
}

/// Append `handle` unless its uuid is already registered. Returns whether it was added.
fn register<P>(registry: &watch::Sender<Vec<ProviderHandle<P>>>, handle: ProviderHandle<P>) -> bool {
    let uuid = handle.info.uuid.clone();
    let name = handle.info.name.clone();
    let added = registry.send_if_modified(move |providers| {
        if providers.iter().any(|p| p.info.uuid == handle.info.uuid) {
            false
        } else {
            providers.push(handle);
            true
        }
    });
    if added {
        info!(uuid = %uuid, name = %name, "Wallet provider discovered");
    }
    added
}
