// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use questsync_remote::RemoteApiError;

/// Errors from the local durable store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store can't be opened, migrated or written.
    #[error("local store unavailable: {0}")]
    Unavailable(String),

    /// The progress event no longer exists or was already synced.
    #[error("progress event {0} not found")]
    NotFound(i64),

    /// A stored value can't be decoded.
    #[error("invalid stored data: {0}")]
    Encoding(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::Unavailable(format!("failed to run migrations: {e}"))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encoding(e.to_string())
    }
}

impl From<jiff::Error> for StoreError {
    fn from(e: jiff::Error) -> Self {
        Self::Encoding(e.to_string())
    }
}

/// Errors from a remote progress store attempt.
///
/// Every variant is recoverable: record and remove fall back to the local
/// queue, the sweep skips the event and retries later.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The remote store couldn't be reached or timed out.
    #[error("network error: {0}")]
    Network(String),

    /// The remote store rejected the credentials.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The remote store rejected the payload.
    #[error("validation error: {0}")]
    Validation(String),
}

impl From<RemoteApiError> for RemoteError {
    fn from(e: RemoteApiError) -> Self {
        match e {
            RemoteApiError::Auth(msg) => Self::Auth(msg),
            RemoteApiError::Validation(msg) => Self::Validation(msg),
            other => Self::Network(other.to_string()),
        }
    }
}

/// Errors surfaced by synchronization sweeps.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Nothing can be synced while the device is offline.
    #[error("cannot sync while offline")]
    Offline,

    /// The pending queue couldn't be read or updated.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The sweep task ended without finishing its pass.
    #[error("sync task aborted: {0}")]
    Aborted(String),
}

/// A background sync registration that couldn't be made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("background sync registration failed: {0}")]
pub struct TriggerError(pub String);
