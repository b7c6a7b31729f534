// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use jiff::civil::Date;

/// What a progress event does to a reading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Mark the day as read.
    Complete,

    /// Clear the read mark of the day.
    Uncomplete,
}

impl Operation {
    /// Stable representation used by the local store.
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Complete => "complete",
            Operation::Uncomplete => "uncomplete",
        }
    }
}

impl AsRef<str> for Operation {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "complete" => Ok(Operation::Complete),
            "uncomplete" => Ok(Operation::Uncomplete),
            _ => Err(()),
        }
    }
}

/// Whether the remote store has acknowledged a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// Saved locally, not yet confirmed by the remote store.
    Pending,

    /// Confirmed by the remote store, eligible for cleanup.
    Synced,
}

impl SyncState {
    /// Stable representation used by the local store.
    pub const fn as_str(self) -> &'static str {
        match self {
            SyncState::Pending => "pending",
            SyncState::Synced => "synced",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncState {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(SyncState::Pending),
            "synced" => Ok(SyncState::Synced),
            _ => Err(()),
        }
    }
}

/// A progress change that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressDraft {
    /// Owner of the reading plan.
    pub user_id: String,

    /// The calendar day being marked.
    pub read_date: Date,

    /// What happens to the day.
    pub operation: Operation,

    /// When the user made the change.
    pub recorded_at: Timestamp,
}

/// A progress event held by the local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Identifier assigned by the local store.
    pub id: i64,

    /// Owner of the reading plan.
    pub user_id: String,

    /// The calendar day being marked.
    pub read_date: Date,

    /// What happens to the day.
    pub operation: Operation,

    /// When the user made the change.
    pub recorded_at: Timestamp,

    /// Whether the remote store has acknowledged the event.
    pub sync_state: SyncState,

    /// Failed remote attempts so far.
    pub attempts: u32,

    /// Message of the most recent failed attempt.
    pub last_error: Option<String>,

    /// Earliest instant the next regular sweep may retry the event.
    pub next_attempt_at: Option<Timestamp>,
}

/// The generated reading plan of a user, cached for offline use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingPlan {
    /// Owner of the plan.
    pub user_id: String,

    /// Reading references scheduled for each day.
    pub readings: BTreeMap<Date, Vec<String>>,

    /// When the plan was last replaced.
    pub last_updated: Timestamp,
}

impl ReadingPlan {
    /// The references scheduled for `date`, empty if it is a rest day.
    pub fn readings_on(&self, date: Date) -> &[String] {
        self.readings
            .get(&date)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Chapter text cached after it was fetched once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedContent {
    /// Name of the book.
    pub book_name: String,

    /// Chapter number within the book.
    pub chapter: u32,

    /// The chapter text.
    pub content: String,

    /// When the text was cached.
    pub cached_at: Timestamp,
}
