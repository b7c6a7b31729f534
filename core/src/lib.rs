// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Offline-first synchronization of reading progress.
//!
//! Progress changes go to the remote store when it is reachable and into a
//! durable local queue when it is not. The queue is drained when connectivity
//! returns, on background signals, or on demand.

mod background;
mod clock;
mod config;
mod error;
mod localdb;
mod quest;
mod reachability;
mod remote;
mod sync;
mod types;

pub use crate::background::{
    BackgroundRegistration, BackgroundSync, BackgroundTrigger, BackgroundWorker, SYNC_TAG,
    SweepTarget,
};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{APP_NAME, Config, ConfigDuration, expand_path, get_config_dir};
pub use crate::error::{RemoteError, StoreError, SyncError, TriggerError};
pub use crate::localdb::{CleanupReport, Contents, LocalDb, Plans, ProgressQueue, Settings};
pub use crate::quest::Quest;
pub use crate::reachability::{OnlineSignal, Reachability};
pub use crate::remote::RemoteProgressStore;
pub use crate::sync::{
    Backoff, Delivery, SweepOutcome, SweepReport, SyncManager, SyncManagerBuilder, SyncOptions,
};
pub use crate::types::{
    CachedContent, Operation, ProgressDraft, ProgressEvent, ReadingPlan, SyncState,
};
