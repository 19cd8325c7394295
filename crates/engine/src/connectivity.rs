// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Debounced online/offline tracking.
//!
//! Platform code (or a [`ReachabilityProbe`]) reports raw signals with
//! [`ConnectivityMonitor::report`]. A background task publishes a settled
//! state only after the raw signal has held for the debounce window, so
//! brief flaps never reach listeners.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::remote::BoxFuture;

/// Checks whether the remote store is reachable.
pub trait ReachabilityProbe: Send + Sync {
    fn probe(&self) -> BoxFuture<'_, bool>;
}

struct Shared {
    raw: watch::Sender<bool>,
    settled: watch::Sender<bool>,
    debounce: Duration,
}

#[derive(Clone)]
pub struct ConnectivityMonitor {
    shared: Arc<Shared>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool, debounce: Duration) -> Self {
        let (raw, _) = watch::channel(initially_online);
        let (settled, _) = watch::channel(initially_online);
        ConnectivityMonitor { shared: Arc::new(Shared { raw, settled, debounce }) }
    }

    /// The settled state.
    pub fn is_online(&self) -> bool {
        *self.shared.settled.borrow()
    }

    /// Reports a raw connectivity signal. Repeats of the current raw value
    /// are ignored.
    pub fn report(&self, online: bool) {
        let changed = self.shared.raw.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            tracing::debug!(online, "raw connectivity signal");
        }
    }

    /// Sets raw and settled state at once, skipping the debounce window.
    #[cfg(test)]
    pub(crate) fn force(&self, online: bool) {
        self.shared.raw.send_replace(online);
        self.shared
            .settled
            .send_if_modified(|current| std::mem::replace(current, online) != online);
    }

    /// A receiver of settled state changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shared.settled.subscribe()
    }

    /// Resolves once the settled state is offline.
    pub async fn wait_offline(&self) {
        let mut rx = self.subscribe();
        loop {
            if !*rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }

    /// Settled state changes, one event per transition.
    pub fn changes(&self) -> ConnectivityChanges {
        ConnectivityChanges { rx: self.subscribe() }
    }

    /// Starts the debounce task. It exits when `shutdown` flips or closes.
    pub fn spawn(&self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(debounce(Arc::clone(&self.shared), shutdown))
    }

    /// Starts polling `probe` every `interval`, feeding results into
    /// [`ConnectivityMonitor::report`].
    pub fn spawn_probe(
        &self,
        probe: Arc<dyn ReachabilityProbe>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => monitor.report(probe.probe().await),
                }
            }
        })
    }
}

async fn debounce(shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    let mut raw = shared.raw.subscribe();
    loop {
        tokio::select! {
            changed = raw.changed() => if changed.is_err() { return },
            _ = shutdown.changed() => return,
        }

        // Wait for the raw signal to hold still for a full window.
        loop {
            tokio::select! {
                _ = tokio::time::sleep(shared.debounce) => break,
                changed = raw.changed() => if changed.is_err() { return },
                _ = shutdown.changed() => return,
            }
        }

        let online = *raw.borrow_and_update();
        let flipped = shared.settled.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if flipped {
            tracing::info!(online, "connectivity changed");
        } else {
            tracing::debug!(online, "connectivity flap suppressed");
        }
    }
}

/// Stream of settled connectivity transitions.
pub struct ConnectivityChanges {
    rx: watch::Receiver<bool>,
}

impl ConnectivityChanges {
    /// Waits for the next transition. Returns `None` once the monitor is gone.
    pub async fn next(&mut self) -> Option<bool> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    pub fn unsubscribe(self) {}
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
