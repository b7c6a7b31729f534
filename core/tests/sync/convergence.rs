// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Convergence tests: the remote store ends with the last change of a day.

use jiff::{SignedDuration, civil};
use questsync_core::{Operation, RemoteError, SweepOutcome};

use crate::common::{Harness, USER};

/// Applies `ops` offline, reconnects, sweeps and reports whether the remote
/// store holds the day afterwards.
async fn converge(ops: &[Operation], remote_row_before: bool) -> (bool, usize) {
    let harness = Harness::new(true).await;
    let day = civil::date(2025, 3, 1);
    if remote_row_before {
        assert!(harness.manager.record_progress(USER, day).await);
    }

    harness.reachability.set_online(false);
    for &op in ops {
        harness.clock.advance(SignedDuration::from_secs(1));
        harness.manager.apply(USER, day, op).await.unwrap();
    }

    harness.reachability.set_online(true);
    let outcome = harness.manager.sweep().await.unwrap();
    assert!(matches!(outcome, SweepOutcome::Completed(_)));

    (
        harness.remote.has_row(USER, day),
        harness.manager.pending_sync_count().await,
    )
}

#[tokio::test]
async fn convergence_last_operation_wins_for_every_sequence() {
    use Operation::{Complete as C, Uncomplete as U};

    let sequences: &[&[Operation]] = &[
        &[C],
        &[U],
        &[C, U],
        &[U, C],
        &[C, C],
        &[C, U, C],
        &[U, C, U],
        &[C, U, C, U],
        &[C, C, U, U, C],
        &[U, U, C, C, U],
    ];

    for ops in sequences {
        let expected = *ops.last().unwrap() == C;
        for remote_row_before in [false, true] {
            let (has_row, pending) = converge(ops, remote_row_before).await;
            assert_eq!(
                has_row, expected,
                "sequence {ops:?} with remote row {remote_row_before}"
            );
            assert_eq!(pending, 0, "sequence {ops:?} left pending events");
        }
    }
}

#[tokio::test]
async fn convergence_queue_holds_at_most_one_event_per_operation() {
    let harness = Harness::new(false).await;
    let day = civil::date(2025, 3, 1);

    for _ in 0..5 {
        assert!(harness.manager.record_progress(USER, day).await);
        assert!(harness.manager.remove_progress(USER, day).await);
    }

    assert_eq!(harness.stored_pending().await, 2);
    let pending = harness.db.progress.list_unsynced().await.unwrap();
    assert_eq!(pending.last().unwrap().operation, Operation::Uncomplete);
}

#[tokio::test]
async fn convergence_survives_a_failed_first_attempt() {
    // Arrange
    let harness = Harness::new(false).await;
    let day = civil::date(2025, 3, 1);
    assert!(harness.manager.remove_progress(USER, day).await);
    assert!(harness.manager.record_progress(USER, day).await);
    harness.reachability.set_online(true);

    // Act
    harness
        .remote
        .fail_with(Some(RemoteError::Network("down".into())));
    harness.manager.sweep().await.unwrap();
    harness.remote.fail_with(None);
    harness.clock.advance(SignedDuration::from_mins(1));
    harness.manager.sweep().await.unwrap();

    // Assert
    assert!(harness.remote.has_row(USER, day));
    assert_eq!(harness.manager.pending_sync_count().await, 0);
}

#[tokio::test]
async fn convergence_days_are_independent() {
    let harness = Harness::new(false).await;
    let first = civil::date(2025, 3, 1);
    let second = civil::date(2025, 3, 2);

    assert!(harness.manager.record_progress(USER, first).await);
    assert!(harness.manager.record_progress(USER, second).await);
    assert!(harness.manager.remove_progress(USER, first).await);

    harness.reachability.set_online(true);
    harness.manager.sweep().await.unwrap();

    assert!(!harness.remote.has_row(USER, first));
    assert!(harness.remote.has_row(USER, second));
}
