// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Debug;

use async_trait::async_trait;
use jiff::Timestamp;
use jiff::civil::Date;
use questsync_remote::{ProgressClient, ProgressRow};

use crate::error::RemoteError;

/// The authoritative store of completed reading days.
///
/// Every write is idempotent: repeating a call leaves the remote state
/// unchanged, so events may be retried after any failure.
#[async_trait]
pub trait RemoteProgressStore: Debug + Send + Sync {
    /// Marks the day as completed, keeping an existing completion as is.
    async fn insert(
        &self,
        user_id: &str,
        read_date: Date,
        completed_at: Timestamp,
    ) -> Result<(), RemoteError>;

    /// Marks the day as completed, overwriting the completion time.
    async fn upsert(
        &self,
        user_id: &str,
        read_date: Date,
        completed_at: Timestamp,
    ) -> Result<(), RemoteError>;

    /// Clears the completion of the day. Clearing a missing day succeeds.
    async fn delete(&self, user_id: &str, read_date: Date) -> Result<(), RemoteError>;
}

#[async_trait]
impl RemoteProgressStore for ProgressClient {
    async fn insert(
        &self,
        user_id: &str,
        read_date: Date,
        completed_at: Timestamp,
    ) -> Result<(), RemoteError> {
        let row = ProgressRow::new(user_id, read_date, completed_at);
        Ok(ProgressClient::insert(self, &row).await?)
    }

    async fn upsert(
        &self,
        user_id: &str,
        read_date: Date,
        completed_at: Timestamp,
    ) -> Result<(), RemoteError> {
        let row = ProgressRow::new(user_id, read_date, completed_at);
        Ok(ProgressClient::upsert(self, &row).await?)
    }

    async fn delete(&self, user_id: &str, read_date: Date) -> Result<(), RemoteError> {
        Ok(ProgressClient::delete(self, user_id, read_date).await?)
    }
}
