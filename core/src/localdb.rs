// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

mod contents;
mod plans;
mod progress;
mod settings;


use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use jiff::Timestamp;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

pub use crate::localdb::contents::Contents;
pub use crate::localdb::plans::Plans;
pub use crate::localdb::progress::ProgressQueue;
pub use crate::localdb::settings::Settings;

use crate::error::StoreError;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// The on-device store: pending progress events, cached plans, cached
/// content and settings.
#[derive(Debug, Clone)]
pub struct LocalDb {
    pool: SqlitePool,

    pub progress: ProgressQueue,
    pub plans: Plans,
    pub contents: Contents,
    pub settings: Settings,
}

impl LocalDb {
    /// Opens a sqlite database and upgrades its schema in place.
    /// If `filename` is `None`, it opens an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the database can't be opened or
    /// a migration fails.
    pub async fn open(filename: Option<&Path>) -> Result<Self, StoreError> {
        let pool = if let Some(filename) = filename {
            tracing::info!(path = %filename.display(), "connecting to SQLite database");
            let options = SqliteConnectOptions::new()
                .filename(filename)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5));

            SqlitePoolOptions::new().connect_with(options).await?
        } else {
            tracing::info!("connecting to in-memory SQLite database");
            // every parse yields a fresh shared-cache database, which must
            // outlive idle connections
            let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("src/localdb/migrations") // relative path from the crate root
            .run(&pool)
            .await?;

        tracing::debug!("local store ready");
        Ok(LocalDb {
            progress: ProgressQueue::new(pool.clone()),
            plans: Plans::new(pool.clone()),
            contents: Contents::new(pool.clone()),
            settings: Settings::new(pool.clone()),
            pool,
        })
    }

    /// Deletes cached content and synced progress events older than `days`.
    ///
    /// Pending progress events are kept regardless of age, they are user
    /// actions the remote store hasn't acknowledged yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be written.
    #[tracing::instrument(skip(self))]
    pub async fn cleanup_older_than(
        &self,
        days: u32,
        now: Timestamp,
    ) -> Result<CleanupReport, StoreError> {
        let cutoff = now
            .as_millisecond()
            .saturating_sub(i64::from(days).saturating_mul(MILLIS_PER_DAY));

        let contents = self.contents.delete_cached_before(cutoff).await?;
        let synced_progress = self.progress.delete_synced_before(cutoff).await?;

        tracing::debug!(contents, synced_progress, "removed stale rows");
        Ok(CleanupReport {
            contents,
            synced_progress,
        })
    }

    pub async fn close(self) {
        tracing::debug!("closing database connection");
        self.pool.close().await;
    }
}

/// Rows removed by [`LocalDb::cleanup_older_than`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub contents: u64,
    pub synced_progress: u64,
}

fn to_millis(ts: Timestamp) -> i64 {
    ts.as_millisecond()
}

fn from_millis(ms: i64) -> Result<Timestamp, StoreError> {
    Ok(Timestamp::from_millisecond(ms)?)
}
