// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Sync manager tests.
//!
//! These tests drive the sync manager with an in-memory remote store, a
//! manual clock and a controllable reachability signal.

mod convergence;
mod durability;
mod record;
mod sweep;
