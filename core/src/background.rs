// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, watch};
use tokio::time::MissedTickBehavior;

use crate::error::TriggerError;

/// Tag used when asking the host to run a deferred sync.
pub const SYNC_TAG: &str = "background-sync-reading-progress";

/// Asks the host to deliver a sync signal later, even if the user has left.
///
/// Registering the same tag repeatedly coalesces into a single delivery.
pub trait BackgroundTrigger: Debug + Send + Sync {
    /// Registers a deferred sync under `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host can't accept the registration.
    fn register(&self, tag: &str) -> Result<(), TriggerError>;
}

/// Receiver of deferred sync signals.
#[async_trait]
pub trait SweepTarget: Send + Sync {
    /// Handles a delivered sync signal. Must tolerate running while another
    /// sweep is in progress.
    async fn on_background_sync_signal(&self);
}

/// In-process background trigger.
///
/// Registrations wake a [`BackgroundWorker`]; with a period set, the worker
/// also wakes on its own so queued events drain without user activity.
#[derive(Debug)]
pub struct BackgroundSync;

impl BackgroundSync {
    /// Creates a connected registration handle and worker.
    pub fn new(period: Option<Duration>) -> (BackgroundRegistration, BackgroundWorker) {
        let notify = Arc::new(Notify::new());
        let closed = Arc::new(AtomicBool::new(false));
        let registration = BackgroundRegistration {
            notify: notify.clone(),
            closed: closed.clone(),
        };
        let worker = BackgroundWorker {
            notify,
            closed,
            period,
        };
        (registration, worker)
    }
}

/// Handle that registers deferred syncs with a [`BackgroundWorker`].
#[derive(Debug, Clone)]
pub struct BackgroundRegistration {
    notify: Arc<Notify>,
    closed: Arc<AtomicBool>,
}

impl BackgroundTrigger for BackgroundRegistration {
    fn register(&self, tag: &str) -> Result<(), TriggerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TriggerError(format!("worker for {tag} has stopped")));
        }

        tracing::debug!(tag, "background sync registered");
        // a stored permit coalesces repeated registrations
        self.notify.notify_one();
        Ok(())
    }
}

/// Delivers registered sync signals to a [`SweepTarget`].
#[derive(Debug)]
pub struct BackgroundWorker {
    notify: Arc<Notify>,
    closed: Arc<AtomicBool>,
    period: Option<Duration>,
}

impl BackgroundWorker {
    /// Runs until `shutdown` turns true or its sender is dropped.
    pub async fn run<T: SweepTarget + ?Sized>(self, target: &T, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = self.period.map(|period| {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        tracing::debug!(period = ?self.period, "background worker started");
        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                () = self.notify.notified() => {
                    tracing::debug!("delivering registered background sync");
                    target.on_background_sync_signal().await;
                }
                _ = async {
                    match ticker.as_mut() {
                        Some(t) => t.tick().await,
                        None => std::future::pending().await,
                    }
                } => {
                    tracing::debug!("delivering periodic background sync");
                    target.on_background_sync_signal().await;
                }
            }
        }
        tracing::debug!("background worker stopped");
    }
}

impl Drop for BackgroundWorker {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}
