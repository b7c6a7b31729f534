// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use jiff::civil::Date;
use jiff::{SignedDuration, Timestamp};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::JoinHandle;

use crate::background::{BackgroundTrigger, SYNC_TAG, SweepTarget};
use crate::clock::{Clock, SystemClock};
use crate::error::{RemoteError, StoreError, SyncError};
use crate::localdb::LocalDb;
use crate::reachability::Reachability;
use crate::remote::RemoteProgressStore;
use crate::types::{Operation, ProgressDraft, ProgressEvent};

/// Tunables of the sync manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Upper bound of a single remote call.
    pub remote_timeout: Duration,

    /// How long connectivity must hold before a reconnect sweep starts.
    pub debounce: Duration,

    /// Retry delays of failing events.
    pub backoff: Backoff,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(8),
            debounce: Duration::from_millis(1500),
            backoff: Backoff::default(),
        }
    }
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(5),
            max: Duration::from_secs(10 * 60),
        }
    }
}

impl Backoff {
    /// Delay before the next attempt of an event that already failed
    /// `attempts` times.
    pub fn delay(&self, attempts: u32) -> Duration {
        let factor = 1u32.checked_shl(attempts).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }
}

/// Where a record or remove ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The remote store accepted the change.
    Remote,

    /// The change waits in the local queue.
    Queued,
}

/// Counts of one sweep run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Events acknowledged by the remote store.
    pub synced: usize,

    /// Events that failed and were rescheduled.
    pub failed: usize,

    /// Events that were no longer pending when their turn came.
    pub skipped: usize,

    /// Events left for a later pass, waiting for a retry delay or an earlier
    /// change of the same day.
    pub deferred: usize,

    /// Whether the run stopped early because the device went offline.
    pub interrupted: bool,
}

impl SweepReport {
    fn absorb(&mut self, other: SweepReport) {
        self.synced += other.synced;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.deferred = other.deferred;
        self.interrupted |= other.interrupted;
    }
}

/// Result of asking for a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// The queue was walked.
    Completed(SweepReport),

    /// Another sweep is running; it will do one more pass afterwards.
    Busy,

    /// Nothing was attempted while offline.
    Offline,

    /// There is no local store to drain.
    NoStore,
}

/// Records reading progress remote-first and drains the offline queue.
///
/// Clones share the same state, including the sweep lock.
#[derive(Debug, Clone)]
pub struct SyncManager {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    remote: Arc<dyn RemoteProgressStore>,
    reachability: Reachability,
    store: Option<LocalDb>,
    trigger: Option<Arc<dyn BackgroundTrigger>>,
    clock: Arc<dyn Clock>,
    options: SyncOptions,
    days: DayLocks,

    busy: AtomicBool,
    rerun: AtomicBool,
    rerun_forced: AtomicBool,
}

/// Builder of [`SyncManager`].
#[derive(Debug)]
pub struct SyncManagerBuilder {
    remote: Arc<dyn RemoteProgressStore>,
    reachability: Reachability,
    store: Option<LocalDb>,
    trigger: Option<Arc<dyn BackgroundTrigger>>,
    clock: Arc<dyn Clock>,
    options: SyncOptions,
}

impl SyncManagerBuilder {
    /// Queue for changes that can't reach the remote store. Without one the
    /// manager runs in remote-only mode.
    pub fn with_store(mut self, store: LocalDb) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_trigger(mut self, trigger: Arc<dyn BackgroundTrigger>) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> SyncManager {
        SyncManager {
            shared: Arc::new(Shared {
                remote: self.remote,
                reachability: self.reachability,
                store: self.store,
                trigger: self.trigger,
                clock: self.clock,
                options: self.options,
                days: DayLocks::default(),
                busy: AtomicBool::new(false),
                rerun: AtomicBool::new(false),
                rerun_forced: AtomicBool::new(false),
            }),
        }
    }
}

impl SyncManager {
    pub fn builder(
        remote: Arc<dyn RemoteProgressStore>,
        reachability: Reachability,
    ) -> SyncManagerBuilder {
        SyncManagerBuilder {
            remote,
            reachability,
            store: None,
            trigger: None,
            clock: Arc::new(SystemClock),
            options: SyncOptions::default(),
        }
    }

    /// Marks the day as read. Returns `false` only if the change was lost.
    pub async fn record_progress(&self, user_id: &str, read_date: Date) -> bool {
        self.apply(user_id, read_date, Operation::Complete)
            .await
            .is_ok()
    }

    /// Clears the read mark of the day. Returns `false` only if the change
    /// was lost.
    pub async fn remove_progress(&self, user_id: &str, read_date: Date) -> bool {
        self.apply(user_id, read_date, Operation::Uncomplete)
            .await
            .is_ok()
    }

    /// Sends the change to the remote store, or queues it if that fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the change could reach neither the remote store
    /// nor the local queue.
    #[tracing::instrument(skip(self))]
    pub async fn apply(
        &self,
        user_id: &str,
        read_date: Date,
        operation: Operation,
    ) -> Result<Delivery, StoreError> {
        let shared = &self.shared;
        // a sweep replaying an older change of this day finishes first
        let _day = shared.days.lock(user_id, read_date).await;
        let now = shared.clock.now();

        if shared.reachability.is_online() {
            match shared.push(user_id, read_date, operation, now, false).await {
                Ok(()) => {
                    tracing::debug!("remote store accepted change");
                    shared.supersede(user_id, read_date).await;
                    return Ok(Delivery::Remote);
                }
                Err(e) => tracing::warn!(err = %e, "remote write failed, queueing change"),
            }
        }

        let Some(store) = &shared.store else {
            tracing::error!("change lost, no local store configured");
            return Err(StoreError::Unavailable("no local store configured".into()));
        };

        let draft = ProgressDraft {
            user_id: user_id.to_string(),
            read_date,
            operation,
            recorded_at: now,
        };
        if let Err(e) = store.progress.save(&draft).await {
            tracing::error!(err = %e, "failed to queue change");
            return Err(e);
        }

        if let Some(trigger) = &shared.trigger
            && let Err(e) = trigger.register(SYNC_TAG)
        {
            tracing::warn!(err = %e, "failed to register background sync");
        }
        Ok(Delivery::Queued)
    }

    /// Pushes due pending events to the remote store.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue can't be read.
    pub async fn sweep(&self) -> Result<SweepOutcome, SyncError> {
        self.spawn_sweep(false).await
    }

    /// Pushes every pending event now, ignoring retry delays.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Offline`] when offline, or an error if the queue
    /// can't be read.
    pub async fn force_sync(&self) -> Result<SweepOutcome, SyncError> {
        if !self.shared.reachability.is_online() {
            return Err(SyncError::Offline);
        }
        self.spawn_sweep(true).await
    }

    /// Number of changes waiting for the remote store.
    pub async fn pending_sync_count(&self) -> usize {
        let Some(store) = &self.shared.store else {
            return 0;
        };

        match store.progress.count_pending().await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(err = %e, "failed to count pending changes");
                0
            }
        }
    }

    /// Changes waiting for the remote store, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue can't be read.
    pub async fn pending_events(&self) -> Result<Vec<ProgressEvent>, StoreError> {
        match &self.shared.store {
            Some(store) => store.progress.list_unsynced().await,
            None => Ok(Vec::new()),
        }
    }

    pub fn is_online(&self) -> bool {
        self.shared.reachability.is_online()
    }

    pub fn reachability(&self) -> &Reachability {
        &self.shared.reachability
    }

    pub fn store(&self) -> Option<&LocalDb> {
        self.shared.store.as_ref()
    }

    /// Sweeps after every settled reconnect, until the manager is dropped or
    /// the task is aborted.
    pub fn spawn_reconnect_listener(&self) -> JoinHandle<()> {
        let mut signal = self
            .shared
            .reachability
            .online_signal(self.shared.options.debounce);
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);

        tokio::spawn(async move {
            while signal.next().await.is_some() {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                let manager = SyncManager { shared };
                tracing::info!("back online, syncing pending changes");
                log_outcome(manager.sweep().await);
            }
        })
    }

    async fn spawn_sweep(&self, force: bool) -> Result<SweepOutcome, SyncError> {
        let shared = self.shared.clone();
        // a dropped caller must not cancel a sweep halfway
        tokio::spawn(async move { Shared::sweep_exclusive(&shared, force).await })
            .await
            .map_err(|e| SyncError::Aborted(e.to_string()))?
    }
}

#[async_trait]
impl SweepTarget for SyncManager {
    async fn on_background_sync_signal(&self) {
        log_outcome(self.sweep().await);
    }
}

fn log_outcome(outcome: Result<SweepOutcome, SyncError>) {
    match outcome {
        Ok(SweepOutcome::Completed(report)) => tracing::info!(
            synced = report.synced,
            failed = report.failed,
            skipped = report.skipped,
            deferred = report.deferred,
            interrupted = report.interrupted,
            "sweep finished"
        ),
        Ok(outcome) => tracing::debug!(?outcome, "sweep not run"),
        Err(e) => tracing::warn!(err = %e, "sweep failed"),
    }
}

impl Shared {
    async fn sweep_exclusive(&self, force: bool) -> Result<SweepOutcome, SyncError> {
        let Some(store) = &self.store else {
            return Ok(SweepOutcome::NoStore);
        };
        if !self.reachability.is_online() {
            return Ok(SweepOutcome::Offline);
        }

        if !self.try_acquire() {
            if force {
                self.rerun_forced.store(true, Ordering::Release);
            }
            self.rerun.store(true, Ordering::Release);
            // the running sweep may have checked for reruns just before this
            if !self.try_acquire() {
                tracing::debug!("sweep already running, scheduled a follow-up pass");
                return Ok(SweepOutcome::Busy);
            }
            self.rerun.store(false, Ordering::Release);
        }

        let mut report = SweepReport::default();
        let mut force = force;
        loop {
            let guard = BusyGuard(&self.busy);
            loop {
                report.absorb(self.sweep_once(store, force).await?);
                if report.interrupted || !self.rerun.swap(false, Ordering::AcqRel) {
                    break;
                }
                force = self.rerun_forced.swap(false, Ordering::AcqRel);
            }
            drop(guard);

            if report.interrupted || !self.rerun.load(Ordering::Acquire) || !self.try_acquire() {
                break;
            }
            self.rerun.store(false, Ordering::Release);
            force = self.rerun_forced.swap(false, Ordering::AcqRel);
        }

        Ok(SweepOutcome::Completed(report))
    }

    /// One pass over the queue in save order.
    ///
    /// Once an event of a day is deferred or fails, later events of the same
    /// day wait for the next pass, so the remote store sees each day's changes
    /// in the order they were made.
    #[tracing::instrument(skip(self, store))]
    async fn sweep_once(&self, store: &LocalDb, force: bool) -> Result<SweepReport, StoreError> {
        let now = self.clock.now();
        let events = store.progress.list_unsynced().await?;
        tracing::debug!(count = events.len(), "sweeping pending changes");

        let mut report = SweepReport::default();
        let mut blocked: HashSet<(String, Date)> = HashSet::new();
        for event in events {
            let key = (event.user_id.clone(), event.read_date);
            let due = force || event.next_attempt_at.is_none_or(|at| at <= now);
            if !due || blocked.contains(&key) {
                blocked.insert(key);
                report.deferred += 1;
                continue;
            }

            if !self.reachability.is_online() {
                tracing::info!("went offline, stopping sweep");
                report.interrupted = true;
                break;
            }

            let _day = self.days.lock(&event.user_id, event.read_date).await;
            if !store.progress.is_pending(event.id).await? {
                report.skipped += 1;
                continue;
            }

            let result = self
                .push(
                    &event.user_id,
                    event.read_date,
                    event.operation,
                    event.recorded_at,
                    true,
                )
                .await;

            match result {
                Ok(()) => match store.progress.mark_synced(event.id, self.clock.now()).await {
                    Ok(()) | Err(StoreError::NotFound(_)) => report.synced += 1,
                    Err(e) => return Err(e),
                },
                Err(e) => {
                    blocked.insert(key);
                    let delay = self.options.backoff.delay(event.attempts);
                    tracing::warn!(id = event.id, err = %e, ?delay, "failed to sync change");
                    let next = retry_at(self.clock.now(), delay);
                    match store
                        .progress
                        .record_failure(event.id, &e.to_string(), next)
                        .await
                    {
                        Ok(()) | Err(StoreError::NotFound(_)) => report.failed += 1,
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        Ok(report)
    }

    /// One bounded remote write. Queued completions overwrite the remote
    /// completion time, direct ones keep an existing row.
    async fn push(
        &self,
        user_id: &str,
        read_date: Date,
        operation: Operation,
        at: Timestamp,
        replay: bool,
    ) -> Result<(), RemoteError> {
        let remote = &self.remote;
        let call = async {
            match (operation, replay) {
                (Operation::Complete, false) => remote.insert(user_id, read_date, at).await,
                (Operation::Complete, true) => remote.upsert(user_id, read_date, at).await,
                (Operation::Uncomplete, _) => remote.delete(user_id, read_date).await,
            }
        };

        let limit = self.options.remote_timeout;
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Network(format!(
                "no response within {}ms",
                limit.as_millis()
            ))),
        }
    }

    /// Drops queued changes of a day the remote store already holds a newer
    /// state for.
    async fn supersede(&self, user_id: &str, read_date: Date) {
        let Some(store) = &self.store else {
            return;
        };

        match store.progress.supersede(user_id, read_date).await {
            Ok(0) => {}
            Ok(n) => tracing::debug!(n, "dropped superseded queued changes"),
            Err(e) => tracing::warn!(err = %e, "failed to drop superseded queued changes"),
        }
    }

    fn try_acquire(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

fn retry_at(now: Timestamp, delay: Duration) -> Timestamp {
    let delay = SignedDuration::try_from(delay).unwrap_or(SignedDuration::MAX);
    now.saturating_add(delay).unwrap_or(now)
}

/// Write locks of single days. A live change and the replay of a queued one
/// never reach the remote store at the same time for the same day.
#[derive(Debug, Default)]
struct DayLocks(Mutex<HashMap<(String, Date), Weak<AsyncMutex<()>>>>);

impl DayLocks {
    async fn lock(&self, user_id: &str, read_date: Date) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| lock.strong_count() > 0);

            let key = (user_id.to_string(), read_date);
            if let Some(lock) = locks.get(&key).and_then(Weak::upgrade) {
                lock
            } else {
                let lock = Arc::new(AsyncMutex::new(()));
                locks.insert(key, Arc::downgrade(&lock));
                lock
            }
        };
        lock.lock_owned().await
    }
}

/// Releases the sweep lock when dropped, even on early return or panic.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
