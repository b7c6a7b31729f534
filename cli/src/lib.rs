// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line interface of questsync: record reading progress offline and
//! sync it to the remote store when a connection is available.

mod cli;
mod cmd_cleanup;
mod cmd_generate_completion;
mod cmd_plan;
mod cmd_progress;
mod cmd_setting;
mod cmd_sync;
mod config;
mod probe;
mod util;

pub use crate::cli::{Cli, Commands, run};
pub use crate::config::{Config, WatchConfig};
