// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! REST client for the remote reading-progress store.
//!
//! The remote store is a PostgREST-style table with a unique constraint on
//! `(user_id, read_date)`, so every write issued by this client is idempotent
//! under retry.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(clippy::single_match_else, clippy::match_bool)]

mod client;
mod config;
mod error;
mod http;
mod types;

pub use crate::client::ProgressClient;
pub use crate::config::{AuthMethod, RemoteConfig};
pub use crate::error::RemoteApiError;
pub use crate::types::ProgressRow;
