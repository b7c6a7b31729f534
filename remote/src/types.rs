// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Timestamp;
use jiff::civil::Date;

/// A completed reading day as stored by the remote store.
///
/// The remote store enforces uniqueness on `(user_id, read_date)`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProgressRow {
    /// Owner of the row.
    pub user_id: String,
    /// The calendar day that was read.
    pub read_date: Date,
    /// When the day was marked as read.
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

impl ProgressRow {
    /// Creates a new `ProgressRow`.
    #[must_use]
    pub fn new(user_id: impl Into<String>, read_date: Date, completed_at: Timestamp) -> Self {
        Self {
            user_id: user_id.into(),
            read_date,
            completed_at: Some(completed_at),
        }
    }
}
