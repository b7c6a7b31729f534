// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Timestamp;
use jiff::civil::Date;
use sqlx::SqlitePool;

use crate::error::StoreError;
use crate::localdb::{from_millis, to_millis};
use crate::types::{Operation, ProgressDraft, ProgressEvent, SyncState};

/// Queue of progress events waiting for the remote store.
#[derive(Debug, Clone)]
pub struct ProgressQueue {
    pool: SqlitePool,
}

impl ProgressQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends a pending event and returns its id.
    ///
    /// A pending event with the same user, day and operation is replaced, so
    /// the queue holds at most one pending event of each kind per day.
    #[tracing::instrument(skip(self, draft), fields(user_id = %draft.user_id, read_date = %draft.read_date))]
    pub async fn save(&self, draft: &ProgressDraft) -> Result<i64, StoreError> {
        const SQL_REPLACE: &str = "
DELETE FROM offline_progress
WHERE user_id = ? AND read_date = ? AND operation = ? AND sync_state = 'pending';
";

        const SQL_INSERT: &str = "
INSERT INTO offline_progress (user_id, read_date, operation, recorded_at, sync_state)
VALUES (?, ?, ?, ?, 'pending');
";

        let mut tx = self.pool.begin().await?;
        let replaced = sqlx::query(SQL_REPLACE)
            .bind(&draft.user_id)
            .bind(draft.read_date.to_string())
            .bind(draft.operation.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let id = sqlx::query(SQL_INSERT)
            .bind(&draft.user_id)
            .bind(draft.read_date.to_string())
            .bind(draft.operation.as_str())
            .bind(to_millis(draft.recorded_at))
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        tx.commit().await?;

        tracing::debug!(id, replaced, operation = %draft.operation, "saved pending event");
        Ok(id)
    }

    /// All pending events in the order they were saved.
    pub async fn list_unsynced(&self) -> Result<Vec<ProgressEvent>, StoreError> {
        const SQL: &str = "
SELECT id, user_id, read_date, operation, recorded_at, sync_state,
       attempts, last_error, next_attempt_at
FROM offline_progress
WHERE sync_state = 'pending'
ORDER BY id ASC;
";

        let records: Vec<ProgressRecord> = sqlx::query_as(SQL).fetch_all(&self.pool).await?;
        records.into_iter().map(TryInto::try_into).collect()
    }

    /// Whether the event still exists and hasn't been synced.
    pub async fn is_pending(&self, id: i64) -> Result<bool, StoreError> {
        const SQL: &str = "
SELECT COUNT(*) FROM offline_progress WHERE id = ? AND sync_state = 'pending';
";

        let count: i64 = sqlx::query_scalar(SQL)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Marks a pending event as acknowledged by the remote store.
    ///
    /// Fails with [`StoreError::NotFound`] if the event is gone or was already
    /// synced.
    pub async fn mark_synced(&self, id: i64, now: Timestamp) -> Result<(), StoreError> {
        const SQL: &str = "
UPDATE offline_progress
SET sync_state = 'synced', synced_at = ?, next_attempt_at = NULL
WHERE id = ? AND sync_state = 'pending';
";

        let result = sqlx::query(SQL)
            .bind(to_millis(now))
            .bind(id)
            .execute(&self.pool)
            .await?;

        match result.rows_affected() {
            0 => Err(StoreError::NotFound(id)),
            _ => Ok(()),
        }
    }

    /// Records a failed remote attempt and when the event may be retried.
    pub async fn record_failure(
        &self,
        id: i64,
        error: &str,
        next_attempt_at: Timestamp,
    ) -> Result<(), StoreError> {
        const SQL: &str = "
UPDATE offline_progress
SET attempts = attempts + 1, last_error = ?, next_attempt_at = ?
WHERE id = ? AND sync_state = 'pending';
";

        let result = sqlx::query(SQL)
            .bind(error)
            .bind(to_millis(next_attempt_at))
            .bind(id)
            .execute(&self.pool)
            .await?;

        match result.rows_affected() {
            0 => Err(StoreError::NotFound(id)),
            _ => Ok(()),
        }
    }

    /// Drops every pending event of a day, of either operation.
    ///
    /// Used once the remote store holds a newer state for the day.
    pub async fn supersede(&self, user_id: &str, read_date: Date) -> Result<u64, StoreError> {
        const SQL: &str = "
DELETE FROM offline_progress
WHERE user_id = ? AND read_date = ? AND sync_state = 'pending';
";

        let result = sqlx::query(SQL)
            .bind(user_id)
            .bind(read_date.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Number of pending events.
    pub async fn count_pending(&self) -> Result<usize, StoreError> {
        const SQL: &str = "SELECT COUNT(*) FROM offline_progress WHERE sync_state = 'pending';";

        let count: i64 = sqlx::query_scalar(SQL).fetch_one(&self.pool).await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Deletes synced events acknowledged before `cutoff` (unix milliseconds).
    pub(crate) async fn delete_synced_before(&self, cutoff: i64) -> Result<u64, StoreError> {
        const SQL: &str = "
DELETE FROM offline_progress
WHERE sync_state = 'synced' AND COALESCE(synced_at, recorded_at) < ?;
";

        let result = sqlx::query(SQL).bind(cutoff).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProgressRecord {
    id: i64,
    user_id: String,
    read_date: String,
    operation: String,
    recorded_at: i64,
    sync_state: String,
    attempts: i64,
    last_error: Option<String>,
    next_attempt_at: Option<i64>,
}

impl TryFrom<ProgressRecord> for ProgressEvent {
    type Error = StoreError;

    fn try_from(record: ProgressRecord) -> Result<Self, Self::Error> {
        let read_date: Date = record.read_date.parse()?;
        let operation = record.operation.parse::<Operation>().map_err(|()| {
            StoreError::Encoding(format!("unknown operation: {}", record.operation))
        })?;
        let sync_state = record.sync_state.parse::<SyncState>().map_err(|()| {
            StoreError::Encoding(format!("unknown sync state: {}", record.sync_state))
        })?;

        Ok(ProgressEvent {
            id: record.id,
            user_id: record.user_id,
            read_date,
            operation,
            recorded_at: from_millis(record.recorded_at)?,
            sync_state,
            attempts: u32::try_from(record.attempts).unwrap_or(u32::MAX),
            last_error: record.last_error,
            next_attempt_at: record.next_attempt_at.map(from_millis).transpose()?,
        })
    }
}
