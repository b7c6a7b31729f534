// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Durability tests: queued changes survive a restart.

use jiff::civil;
use questsync_core::{LocalDb, Operation, RemoteError};

use crate::common::{Harness, USER, setup_temp_dirs};

#[tokio::test]
async fn durability_queued_change_survives_reopen() {
    // Arrange
    let dirs = setup_temp_dirs().await.unwrap();
    let db = LocalDb::open(Some(&dirs.db_path())).await.unwrap();
    let harness = Harness::with_db(db, true);
    harness
        .remote
        .fail_with(Some(RemoteError::Network("down".into())));
    let day = civil::date(2025, 3, 2);

    // Act
    assert!(harness.manager.record_progress(USER, day).await);
    drop(harness.manager);
    harness.db.close().await;
    let reopened = LocalDb::open(Some(&dirs.db_path())).await.unwrap();

    // Assert
    let pending = reopened.progress.list_unsynced().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].user_id, USER);
    assert_eq!(pending[0].read_date, day);
    assert_eq!(pending[0].operation, Operation::Complete);
}

#[tokio::test]
async fn durability_reopened_queue_drains_to_remote() {
    // Arrange
    let dirs = setup_temp_dirs().await.unwrap();
    {
        let db = LocalDb::open(Some(&dirs.db_path())).await.unwrap();
        let harness = Harness::with_db(db, false);
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
        drop(harness.manager);
        harness.db.close().await;
    }

    // Act
    let db = LocalDb::open(Some(&dirs.db_path())).await.unwrap();
    let harness = Harness::with_db(db, true);
    assert_eq!(harness.manager.pending_sync_count().await, 2);
    harness.manager.sweep().await.unwrap();

    // Assert
    assert!(harness.remote.has_row(USER, civil::date(2025, 3, 1)));
    assert_eq!(harness.manager.pending_sync_count().await, 0);
}
