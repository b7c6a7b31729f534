// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use questsync_core::Reachability;
use questsync_remote::ProgressClient;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Detects connectivity by pinging the remote store.
#[derive(Debug, Clone)]
pub struct Probe {
    client: ProgressClient,
    offline: bool,
}

impl Probe {
    /// `offline` pins the result to unreachable without touching the network.
    pub fn new(client: ProgressClient, offline: bool) -> Self {
        Self { client, offline }
    }

    pub async fn check(&self) -> bool {
        if self.offline {
            return false;
        }

        match self.client.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::info!(err = %e, "remote store unreachable");
                false
            }
        }
    }

    /// Re-probes every `interval` and publishes the result until `shutdown`
    /// turns true.
    pub fn spawn(
        self,
        reachability: Reachability,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        reachability.set_online(self.check().await);
                    }
                }
            }
            tracing::debug!("connectivity probe stopped");
        })
    }
}
