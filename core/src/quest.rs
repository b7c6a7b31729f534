// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;

use jiff::civil::Date;
use tokio::fs;
use tokio::sync::watch;

use crate::background::{BackgroundSync, BackgroundWorker};
use crate::clock::{Clock, SystemClock};
use crate::localdb::{CleanupReport, LocalDb};
use crate::reachability::Reachability;
use crate::remote::RemoteProgressStore;
use crate::sync::{Delivery, SweepOutcome, SyncManager};
use crate::types::{Operation, ProgressEvent, ReadingPlan};
use crate::{Config, SyncError};

/// Reading-progress application core.
#[derive(Debug)]
pub struct Quest {
    config: Config,
    db: Option<LocalDb>,
    manager: SyncManager,
    worker: Option<BackgroundWorker>,
    clock: Arc<dyn Clock>,
}

impl Quest {
    /// Creates a new instance with the given configuration.
    ///
    /// If the local store can't be opened, the instance still works but
    /// changes made while the remote store is unreachable are lost.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub async fn new(
        config: Config,
        remote: Arc<dyn RemoteProgressStore>,
        online: bool,
    ) -> Result<Self, Box<dyn Error>> {
        Self::with_clock(config, remote, online, Arc::new(SystemClock)).await
    }

    /// Like [`Quest::new`], reading the time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub async fn with_clock(
        mut config: Config,
        remote: Arc<dyn RemoteProgressStore>,
        online: bool,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, Box<dyn Error>> {
        config.normalize()?;

        let db = match open_db(&config).await {
            Ok(db) => Some(db),
            Err(e) => {
                tracing::warn!(err = %e, "local store unavailable, running remote-only");
                None
            }
        };

        let (registration, worker) = BackgroundSync::new(config.background_period());
        let mut builder = SyncManager::builder(remote, Reachability::new(online))
            .with_trigger(Arc::new(registration))
            .with_clock(clock.clone())
            .with_options(config.sync_options());
        if let Some(db) = &db {
            builder = builder.with_store(db.clone());
        }

        Ok(Self {
            config,
            db,
            manager: builder.build(),
            worker: Some(worker),
            clock,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn manager(&self) -> &SyncManager {
        &self.manager
    }

    /// Marks the day as read for the configured user.
    ///
    /// # Errors
    ///
    /// Returns an error if the change was lost.
    pub async fn record(&self, read_date: Date) -> Result<Delivery, Box<dyn Error>> {
        let delivery = self
            .manager
            .apply(&self.config.user_id, read_date, Operation::Complete)
            .await?;
        Ok(delivery)
    }

    /// Clears the read mark of the day for the configured user.
    ///
    /// # Errors
    ///
    /// Returns an error if the change was lost.
    pub async fn remove(&self, read_date: Date) -> Result<Delivery, Box<dyn Error>> {
        let delivery = self
            .manager
            .apply(&self.config.user_id, read_date, Operation::Uncomplete)
            .await?;
        Ok(delivery)
    }

    pub async fn pending_count(&self) -> usize {
        self.manager.pending_sync_count().await
    }

    /// Changes waiting for the remote store, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store can't be read.
    pub async fn pending_events(&self) -> Result<Vec<ProgressEvent>, Box<dyn Error>> {
        Ok(self.manager.pending_events().await?)
    }

    /// Pushes every pending change now.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Offline`] when offline.
    pub async fn force_sync(&self) -> Result<SweepOutcome, SyncError> {
        self.manager.force_sync().await
    }

    pub fn is_online(&self) -> bool {
        self.manager.is_online()
    }

    pub fn set_online(&self, online: bool) {
        self.manager.reachability().set_online(online);
    }

    /// The cached reading plan of the configured user.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store is unavailable or can't be read.
    pub async fn plan(&self) -> Result<Option<ReadingPlan>, Box<dyn Error>> {
        let db = self.db()?;
        Ok(db.plans.get(&self.config.user_id).await?)
    }

    /// Replaces the cached reading plan of the configured user.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store is unavailable or can't be written.
    pub async fn save_plan(
        &self,
        readings: BTreeMap<Date, Vec<String>>,
    ) -> Result<ReadingPlan, Box<dyn Error>> {
        let plan = ReadingPlan {
            user_id: self.config.user_id.clone(),
            readings,
            last_updated: self.clock.now(),
        };
        let db = self.db()?;
        db.plans.put(&plan).await?;
        Ok(plan)
    }

    /// Reads a setting as raw JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store is unavailable or can't be read.
    pub async fn setting(&self, key: &str) -> Result<Option<serde_json::Value>, Box<dyn Error>> {
        let db = self.db()?;
        Ok(db.settings.get(key).await?)
    }

    /// Stores a setting as raw JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store is unavailable or can't be written.
    pub async fn set_setting(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), Box<dyn Error>> {
        let db = self.db()?;
        Ok(db.settings.set(key, value).await?)
    }

    /// Removes synced changes and cached content older than `days`, or the
    /// configured age if `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store is unavailable or can't be written.
    pub async fn cleanup(&self, days: Option<u32>) -> Result<CleanupReport, Box<dyn Error>> {
        let days = days.unwrap_or(self.config.cleanup_days);
        let db = self.db()?;
        Ok(db.cleanup_older_than(days, self.clock.now()).await?)
    }

    /// Syncs on reconnects and background signals until `shutdown` turns
    /// true. Can only run once per instance.
    ///
    /// # Errors
    ///
    /// Returns an error if called a second time.
    pub async fn watch(&mut self, shutdown: watch::Receiver<bool>) -> Result<(), Box<dyn Error>> {
        let worker = self.worker.take().ok_or("Background worker already used")?;
        let listener = self.manager.spawn_reconnect_listener();

        if self.manager.is_online() {
            tracing::info!("syncing pending changes on start");
            match self.manager.sweep().await {
                Ok(outcome) => tracing::debug!(?outcome, "initial sweep done"),
                Err(e) => tracing::warn!(err = %e, "initial sweep failed"),
            }
        }

        worker.run(&self.manager, shutdown).await;
        listener.abort();
        Ok(())
    }

    /// Close the instance, flushing the local store.
    pub async fn close(self) {
        if let Some(db) = self.db {
            db.close().await;
        }
    }

    fn db(&self) -> Result<&LocalDb, Box<dyn Error>> {
        self.db
            .as_ref()
            .ok_or_else(|| "Local store unavailable".into())
    }
}

async fn open_db(config: &Config) -> Result<LocalDb, Box<dyn Error>> {
    let path = config.db_path().ok_or("No state directory configured")?;
    if let Some(parent) = path.parent() {
        tracing::debug!(path = %parent.display(), "ensuring state directory exists");
        fs::create_dir_all(parent).await?;
    }

    let db = LocalDb::open(Some(&path))
        .await
        .map_err(|e| format!("Failed to initialize db: {e}"))?;
    Ok(db)
}
