// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Tracks whether the device believes it can reach the network.
///
/// The host platform feeds connectivity changes in with [`set_online`], the
/// sync manager reads the current value and reacts to transitions.
///
/// [`set_online`]: Reachability::set_online
#[derive(Debug, Clone)]
pub struct Reachability {
    tx: Arc<watch::Sender<bool>>,
}

impl Reachability {
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Updates the connectivity state. Repeated values are ignored and don't
    /// wake subscribers.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed && online {
            tracing::info!("network connectivity restored");
        } else if changed {
            tracing::info!("network connectivity lost");
        }
    }

    /// A receiver of connectivity changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// A stream of offline-to-online transitions that held for `debounce`.
    pub fn online_signal(&self, debounce: Duration) -> OnlineSignal {
        OnlineSignal {
            rx: self.subscribe(),
            debounce,
        }
    }
}

/// Yields once per offline-to-online transition.
///
/// A transition only counts if the device is still online after the debounce
/// delay, so flapping connectivity produces at most one signal.
#[derive(Debug)]
pub struct OnlineSignal {
    rx: watch::Receiver<bool>,
    debounce: Duration,
}

impl OnlineSignal {
    /// Waits for the next settled transition to online.
    ///
    /// Returns `None` once every [`Reachability`] handle is dropped.
    pub async fn next(&mut self) -> Option<()> {
        loop {
            self.rx.changed().await.ok()?;
            if !*self.rx.borrow_and_update() {
                continue;
            }

            if !self.debounce.is_zero() {
                tokio::time::sleep(self.debounce).await;
            }

            if *self.rx.borrow_and_update() {
                return Some(());
            }
            tracing::debug!("connectivity dropped again within debounce window");
        }
    }
}
