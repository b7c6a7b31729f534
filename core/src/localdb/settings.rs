// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;

use crate::error::StoreError;

/// Small application state persisted as JSON values.
#[derive(Debug, Clone)]
pub struct Settings {
    pool: SqlitePool,
}

impl Settings {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        const SQL: &str = "SELECT value FROM app_settings WHERE key = ?;";

        let value: Option<String> = sqlx::query_scalar(SQL)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match value {
            Some(v) => Ok(Some(serde_json::from_str(&v)?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        const SQL: &str = "
INSERT INTO app_settings (key, value)
VALUES (?, ?)
ON CONFLICT(key) DO UPDATE SET value = excluded.value;
";

        let value = serde_json::to_string(value)?;
        sqlx::query(SQL)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        const SQL: &str = "DELETE FROM app_settings WHERE key = ?;";

        let result = sqlx::query(SQL).bind(key).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
