// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Record and remove tests.

use std::sync::Arc;
use std::time::Duration;

use jiff::civil;
use questsync_core::{
    Clock, Delivery, Operation, Reachability, RemoteError, StoreError, SyncManager, SyncState,
};

use crate::common::{FakeRemote, Harness, RemoteCall, USER, test_options};

#[tokio::test]
async fn record_online_writes_remote_without_queueing() {
    // Arrange
    let harness = Harness::new(true).await;
    let day = civil::date(2025, 3, 1);

    // Act
    let delivery = harness
        .manager
        .apply(USER, day, Operation::Complete)
        .await
        .unwrap();

    // Assert
    assert_eq!(delivery, Delivery::Remote);
    assert!(harness.remote.has_row(USER, day));
    assert_eq!(harness.remote.calls(), [RemoteCall::Insert(USER.into(), day)]);
    assert_eq!(harness.stored_pending().await, 0);
    assert_eq!(harness.trigger.count(), 0);
}

#[tokio::test]
async fn remove_online_deletes_remote_row() {
    let harness = Harness::new(true).await;
    let day = civil::date(2025, 3, 1);
    assert!(harness.manager.record_progress(USER, day).await);

    assert!(harness.manager.remove_progress(USER, day).await);

    assert!(!harness.remote.has_row(USER, day));
    assert_eq!(harness.stored_pending().await, 0);
}

#[tokio::test]
async fn record_offline_queues_without_remote_call() {
    // Arrange
    let harness = Harness::new(false).await;
    let day = civil::date(2025, 3, 2);

    // Act
    let delivery = harness
        .manager
        .apply(USER, day, Operation::Complete)
        .await
        .unwrap();

    // Assert
    assert_eq!(delivery, Delivery::Queued);
    assert!(harness.remote.calls().is_empty());

    let pending = harness.db.progress.list_unsynced().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].user_id, USER);
    assert_eq!(pending[0].read_date, day);
    assert_eq!(pending[0].operation, Operation::Complete);
    assert_eq!(pending[0].sync_state, SyncState::Pending);
    assert_eq!(pending[0].recorded_at, harness.clock.now());
}

#[tokio::test]
async fn record_falls_back_to_queue_on_remote_error() {
    let harness = Harness::new(true).await;
    harness
        .remote
        .fail_with(Some(RemoteError::Auth("JWT expired".into())));
    let day = civil::date(2025, 3, 1);

    let delivery = harness
        .manager
        .apply(USER, day, Operation::Complete)
        .await
        .unwrap();

    assert_eq!(delivery, Delivery::Queued);
    assert_eq!(harness.manager.pending_sync_count().await, 1);
}

#[tokio::test]
async fn record_falls_back_to_queue_on_remote_timeout() {
    let harness = Harness::new(true).await;
    harness.remote.delay_by(Some(Duration::from_secs(5)));
    let day = civil::date(2025, 3, 1);

    let delivery = tokio::time::timeout(
        Duration::from_secs(2),
        harness.manager.apply(USER, day, Operation::Complete),
    )
    .await
    .expect("remote timeout must bound the call")
    .unwrap();

    assert_eq!(delivery, Delivery::Queued);
    assert_eq!(harness.manager.pending_sync_count().await, 1);
}

#[tokio::test]
async fn record_and_remove_both_register_background_sync() {
    let harness = Harness::new(false).await;

    assert!(
        harness
            .manager
            .record_progress(USER, civil::date(2025, 3, 1))
            .await
    );
    assert!(
        harness
            .manager
            .remove_progress(USER, civil::date(2025, 3, 2))
            .await
    );

    assert_eq!(harness.trigger.count(), 2);
}

#[tokio::test]
async fn record_succeeds_when_background_registration_fails() {
    let harness = Harness::new(false).await;
    harness.trigger.set_failing(true);

    assert!(
        harness
            .manager
            .record_progress(USER, civil::date(2025, 3, 1))
            .await
    );
    assert_eq!(harness.manager.pending_sync_count().await, 1);
}

#[tokio::test]
async fn record_online_supersedes_stale_queued_change() {
    // Arrange
    let harness = Harness::new(false).await;
    let day = civil::date(2025, 3, 1);
    assert!(harness.manager.remove_progress(USER, day).await);
    assert_eq!(harness.stored_pending().await, 1);

    // Act
    harness.reachability.set_online(true);
    assert!(harness.manager.record_progress(USER, day).await);

    // Assert
    assert!(harness.remote.has_row(USER, day));
    assert_eq!(harness.stored_pending().await, 0);
}

#[tokio::test]
async fn record_without_store_reports_loss_when_remote_fails() {
    // Arrange
    let remote = FakeRemote::new();
    remote.fail_with(Some(RemoteError::Network("down".into())));
    let manager = SyncManager::builder(Arc::new(remote.clone()), Reachability::new(true))
        .with_options(test_options())
        .build();
    let day = civil::date(2025, 3, 1);

    // Act
    let err = manager
        .apply(USER, day, Operation::Complete)
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(err, StoreError::Unavailable(_)));
    assert!(!manager.record_progress(USER, day).await);
    assert_eq!(manager.pending_sync_count().await, 0);

    remote.fail_with(None);
    assert!(manager.record_progress(USER, day).await);
    assert!(remote.has_row(USER, day));
}

#[tokio::test]
async fn record_with_closed_store_reports_loss() {
    let harness = Harness::new(false).await;
    harness.db.clone().close().await;

    assert!(
        !harness
            .manager
            .record_progress(USER, civil::date(2025, 3, 1))
            .await
    );
    assert_eq!(harness.manager.pending_sync_count().await, 0);
}

#[tokio::test]
async fn record_during_sweep_lands_after_stale_removal() {
    // Arrange
    let harness = Harness::new(false).await;
    let day = civil::date(2025, 3, 3);
    assert!(harness.manager.remove_progress(USER, day).await);
    harness.remote.delay_calls(
        |call| matches!(call, RemoteCall::Delete(..)),
        Duration::from_millis(100),
    );
    harness.reachability.set_online(true);

    // Act
    let manager = harness.manager.clone();
    let sweep = tokio::spawn(async move { manager.sweep().await });
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(harness.manager.record_progress(USER, day).await);
    sweep.await.unwrap().unwrap();

    // Assert
    assert!(harness.remote.has_row(USER, day));
    assert_eq!(
        harness.remote.calls(),
        [
            RemoteCall::Delete(USER.into(), day),
            RemoteCall::Insert(USER.into(), day)
        ]
    );
    assert_eq!(harness.manager.pending_sync_count().await, 0);
}

#[tokio::test]
async fn remove_during_sweep_lands_after_stale_completion() {
    // Arrange
    let harness = Harness::new(false).await;
    let day = civil::date(2025, 3, 4);
    assert!(harness.manager.record_progress(USER, day).await);
    harness.remote.delay_calls(
        |call| matches!(call, RemoteCall::Upsert(..)),
        Duration::from_millis(100),
    );
    harness.reachability.set_online(true);

    // Act
    let manager = harness.manager.clone();
    let sweep = tokio::spawn(async move { manager.sweep().await });
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(harness.manager.remove_progress(USER, day).await);
    sweep.await.unwrap().unwrap();

    // Assert
    assert!(!harness.remote.has_row(USER, day));
    assert_eq!(
        harness.remote.calls(),
        [
            RemoteCall::Upsert(USER.into(), day),
            RemoteCall::Delete(USER.into(), day)
        ]
    );
    assert_eq!(harness.manager.pending_sync_count().await, 0);
}

#[tokio::test]
async fn record_during_sweep_of_other_day_is_not_held_back() {
    let harness = Harness::new(false).await;
    let queued = civil::date(2025, 3, 5);
    let live = civil::date(2025, 3, 6);
    assert!(harness.manager.remove_progress(USER, queued).await);
    harness.remote.delay_calls(
        |call| matches!(call, RemoteCall::Delete(..)),
        Duration::from_millis(150),
    );
    harness.reachability.set_online(true);

    let manager = harness.manager.clone();
    let sweep = tokio::spawn(async move { manager.sweep().await });
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(harness.manager.record_progress(USER, live).await);

    // the live write finished while the other day's replay is still in flight
    assert!(harness.remote.has_row(USER, live));
    assert_eq!(harness.remote.calls(), [RemoteCall::Insert(USER.into(), live)]);
    sweep.await.unwrap().unwrap();
    assert_eq!(harness.manager.pending_sync_count().await, 0);
}
