// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Sync manager wired to test doubles.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use jiff::Timestamp;
use questsync_core::{
    Backoff, BackgroundTrigger, Config, LocalDb, ManualClock, Reachability, SyncManager,
    SyncOptions, TriggerError,
};

use crate::common::FakeRemote;

/// User id used by the tests.
pub const USER: &str = "user-1";

/// Parses an RFC 3339 timestamp.
#[must_use]
pub fn ts(s: &str) -> Timestamp {
    s.parse().expect("invalid timestamp")
}

/// Options with short delays so tests never wait long.
#[must_use]
pub fn test_options() -> SyncOptions {
    SyncOptions {
        remote_timeout: Duration::from_millis(200),
        debounce: Duration::ZERO,
        backoff: Backoff {
            base: Duration::from_secs(5),
            max: Duration::from_secs(60),
        },
    }
}

/// Creates a configuration for [`USER`] storing state in `state_dir`.
#[must_use]
pub fn test_config(state_dir: &Path) -> Config {
    let mut config = Config::new(USER);
    config.state_dir = Some(PathBuf::from(state_dir));
    config
}

/// Background trigger counting registrations.
#[derive(Debug, Clone, Default)]
pub struct RecordingTrigger {
    registrations: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl RecordingTrigger {
    pub fn count(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl BackgroundTrigger for RecordingTrigger {
    fn register(&self, tag: &str) -> Result<(), TriggerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TriggerError(format!("{tag} rejected")));
        }
        self.registrations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A sync manager with every collaborator exposed.
#[derive(Debug)]
pub struct Harness {
    pub remote: FakeRemote,
    pub reachability: Reachability,
    pub db: LocalDb,
    pub clock: Arc<ManualClock>,
    pub trigger: RecordingTrigger,
    pub manager: SyncManager,
}

#[allow(dead_code)]
impl Harness {
    /// Creates a harness on an in-memory store.
    pub async fn new(online: bool) -> Self {
        let db = LocalDb::open(None)
            .await
            .expect("Failed to create test database");
        Self::with_db(db, online)
    }

    /// Creates a harness on an existing store.
    pub fn with_db(db: LocalDb, online: bool) -> Self {
        let remote = FakeRemote::new();
        let reachability = Reachability::new(online);
        let clock = Arc::new(ManualClock::new(ts("2025-03-01T08:00:00Z")));
        let trigger = RecordingTrigger::default();
        let manager = SyncManager::builder(Arc::new(remote.clone()), reachability.clone())
            .with_store(db.clone())
            .with_clock(clock.clone())
            .with_trigger(Arc::new(trigger.clone()))
            .with_options(test_options())
            .build();

        Self {
            remote,
            reachability,
            db,
            clock,
            trigger,
            manager,
        }
    }

    /// Pending rows counted straight from the store.
    pub async fn stored_pending(&self) -> usize {
        self.db
            .progress
            .list_unsynced()
            .await
            .expect("Failed to list pending events")
            .len()
    }
}
