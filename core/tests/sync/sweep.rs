// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Sweep tests: exclusivity, retry delays and early stops.

use std::sync::Arc;
use std::time::Duration;

use jiff::{SignedDuration, civil};
use questsync_core::{
    Reachability, RemoteError, StoreError, SweepOutcome, SweepReport, SyncError, SyncManager,
};

use crate::common::{FakeRemote, Harness, RemoteCall, USER, test_options, ts};

fn completed(outcome: SweepOutcome) -> SweepReport {
    match outcome {
        SweepOutcome::Completed(report) => report,
        other => panic!("expected a completed sweep, got {other:?}"),
    }
}

#[tokio::test]
async fn sweep_with_empty_queue_is_a_no_op() {
    let harness = Harness::new(true).await;

    let report = completed(harness.manager.sweep().await.unwrap());

    assert_eq!(report, SweepReport::default());
    assert!(harness.remote.calls().is_empty());
}

#[tokio::test]
async fn sweep_offline_does_nothing() {
    let harness = Harness::new(false).await;
    assert!(
        harness
            .manager
            .record_progress(USER, civil::date(2025, 3, 1))
            .await
    );

    let outcome = harness.manager.sweep().await.unwrap();

    assert_eq!(outcome, SweepOutcome::Offline);
    assert_eq!(harness.manager.pending_sync_count().await, 1);
}

#[tokio::test]
async fn sweep_without_store_reports_no_store() {
    let manager = SyncManager::builder(Arc::new(FakeRemote::new()), Reachability::new(true))
        .with_options(test_options())
        .build();

    assert_eq!(manager.sweep().await.unwrap(), SweepOutcome::NoStore);
}

#[tokio::test]
async fn sweep_replays_completion_with_original_time() {
    // Arrange
    let harness = Harness::new(false).await;
    let day = civil::date(2025, 3, 1);
    let recorded_at = ts("2025-03-01T08:00:00Z");
    assert!(harness.manager.record_progress(USER, day).await);

    // Act
    harness.clock.advance(SignedDuration::from_hours(3));
    harness.reachability.set_online(true);
    let report = completed(harness.manager.sweep().await.unwrap());

    // Assert
    assert_eq!(report.synced, 1);
    assert_eq!(harness.remote.calls(), [RemoteCall::Upsert(USER.into(), day)]);
    assert_eq!(harness.remote.completed_at(USER, day), Some(recorded_at));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sweep_twice_concurrently_delivers_each_event_once() {
    // Arrange
    let harness = Harness::new(false).await;
    for d in 1..=3 {
        assert!(
            harness
                .manager
                .record_progress(USER, civil::date(2025, 3, d))
                .await
        );
    }
    harness.reachability.set_online(true);
    harness.remote.delay_by(Some(Duration::from_millis(50)));

    // Act
    let (a, b) = tokio::join!(harness.manager.sweep(), harness.manager.sweep());

    // Assert
    let synced: usize = [a.unwrap(), b.unwrap()]
        .into_iter()
        .map(|outcome| match outcome {
            SweepOutcome::Completed(report) => report.synced,
            _ => 0,
        })
        .sum();
    assert_eq!(synced, 3);
    assert_eq!(harness.remote.calls().len(), 3);
    assert_eq!(harness.manager.pending_sync_count().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sweep_requested_while_busy_runs_follow_up_pass() {
    // Arrange
    let harness = Harness::new(true).await;
    harness
        .remote
        .fail_with(Some(RemoteError::Network("down".into())));
    assert!(
        harness
            .manager
            .record_progress(USER, civil::date(2025, 3, 1))
            .await
    );
    harness.remote.fail_with(None);
    harness.remote.delay_by(Some(Duration::from_millis(100)));

    // Act
    let running = {
        let manager = harness.manager.clone();
        tokio::spawn(async move { manager.force_sync().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    harness.reachability.set_online(false);
    assert!(
        harness
            .manager
            .record_progress(USER, civil::date(2025, 3, 2))
            .await
    );
    harness.reachability.set_online(true);
    let second = harness.manager.force_sync().await.unwrap();

    // Assert
    assert_eq!(second, SweepOutcome::Busy);
    let first = completed(running.await.unwrap().unwrap());
    assert_eq!(first.synced, 2);
    assert_eq!(harness.manager.pending_sync_count().await, 0);
}

#[tokio::test]
async fn sweep_failure_backs_off_until_delay_elapses() {
    // Arrange
    let harness = Harness::new(false).await;
    let day = civil::date(2025, 3, 1);
    assert!(harness.manager.record_progress(USER, day).await);
    harness.reachability.set_online(true);
    harness
        .remote
        .fail_with(Some(RemoteError::Network("down".into())));

    // Act
    let first = completed(harness.manager.sweep().await.unwrap());
    harness.remote.fail_with(None);
    let early = completed(harness.manager.sweep().await.unwrap());
    harness.clock.advance(SignedDuration::from_secs(5));
    let due = completed(harness.manager.sweep().await.unwrap());

    // Assert
    assert_eq!(first.failed, 1);
    assert_eq!(early.deferred, 1);
    assert_eq!(early.synced, 0);
    assert_eq!(due.synced, 1);
    assert!(harness.remote.has_row(USER, day));
}

#[tokio::test]
async fn sweep_failures_double_the_retry_delay() {
    let harness = Harness::new(false).await;
    assert!(
        harness
            .manager
            .record_progress(USER, civil::date(2025, 3, 1))
            .await
    );
    harness.reachability.set_online(true);
    harness
        .remote
        .fail_with(Some(RemoteError::Network("down".into())));

    harness.manager.sweep().await.unwrap();
    harness.clock.advance(SignedDuration::from_secs(5));
    harness.manager.sweep().await.unwrap();

    let pending = harness.db.progress.list_unsynced().await.unwrap();
    assert_eq!(pending[0].attempts, 2);
    assert_eq!(
        pending[0].next_attempt_at,
        Some(ts("2025-03-01T08:00:15Z"))
    );
    assert_eq!(pending[0].last_error.as_deref(), Some("network error: down"));
}

#[tokio::test]
async fn force_sync_ignores_retry_delay() {
    let harness = Harness::new(false).await;
    assert!(
        harness
            .manager
            .record_progress(USER, civil::date(2025, 3, 1))
            .await
    );
    harness.reachability.set_online(true);
    harness
        .remote
        .fail_with(Some(RemoteError::Validation("bad row".into())));
    harness.manager.sweep().await.unwrap();
    harness.remote.fail_with(None);

    let report = completed(harness.manager.force_sync().await.unwrap());

    assert_eq!(report.synced, 1);
    assert_eq!(harness.manager.pending_sync_count().await, 0);
}

#[tokio::test]
async fn force_sync_offline_is_an_error() {
    let harness = Harness::new(false).await;

    let err = harness.manager.force_sync().await.unwrap_err();

    assert!(matches!(err, SyncError::Offline));
    assert_eq!(err.to_string(), "cannot sync while offline");
}

#[tokio::test]
async fn sweep_keeps_later_change_of_failed_day_queued() {
    // Arrange
    let harness = Harness::new(false).await;
    let day = civil::date(2025, 3, 1);
    assert!(harness.manager.record_progress(USER, day).await);
    assert!(harness.manager.remove_progress(USER, day).await);
    harness.reachability.set_online(true);
    harness
        .remote
        .fail_with(Some(RemoteError::Network("down".into())));

    // Act
    let report = completed(harness.manager.sweep().await.unwrap());

    // Assert
    assert_eq!(report.failed, 1);
    assert_eq!(report.deferred, 1);
    assert_eq!(harness.stored_pending().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sweep_stops_when_connectivity_drops() {
    // Arrange
    let harness = Harness::new(false).await;
    for d in 1..=4 {
        assert!(
            harness
                .manager
                .record_progress(USER, civil::date(2025, 3, d))
                .await
        );
    }
    harness.reachability.set_online(true);
    harness.remote.delay_by(Some(Duration::from_millis(100)));

    // Act
    let sweep = {
        let manager = harness.manager.clone();
        tokio::spawn(async move { manager.sweep().await })
    };
    tokio::time::sleep(Duration::from_millis(150)).await;
    harness.reachability.set_online(false);
    let report = completed(sweep.await.unwrap().unwrap());

    // Assert
    assert!(report.interrupted);
    assert!(report.synced < 4);
    assert_eq!(
        harness.manager.pending_sync_count().await,
        4 - report.synced
    );
}

#[tokio::test]
async fn mark_synced_on_unknown_id_leaves_other_rows_alone() {
    // Arrange
    let harness = Harness::new(false).await;
    assert!(
        harness
            .manager
            .record_progress(USER, civil::date(2025, 3, 1))
            .await
    );
    let before = harness.db.progress.list_unsynced().await.unwrap();

    // Act
    let err = harness
        .db
        .progress
        .mark_synced(i64::MAX, ts("2025-03-01T09:00:00Z"))
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(err, StoreError::NotFound(i64::MAX)));
    assert_eq!(harness.db.progress.list_unsynced().await.unwrap(), before);
}
