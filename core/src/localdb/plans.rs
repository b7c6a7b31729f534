// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use jiff::civil::Date;
use sqlx::SqlitePool;

use crate::error::StoreError;
use crate::localdb::{from_millis, to_millis};
use crate::types::ReadingPlan;

/// Cached reading plans, one per user.
#[derive(Debug, Clone)]
pub struct Plans {
    pool: SqlitePool,
}

impl Plans {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stores the plan, replacing any plan cached for the same user.
    pub async fn put(&self, plan: &ReadingPlan) -> Result<(), StoreError> {
        const SQL: &str = "
INSERT INTO offline_plans (user_id, plan_data, last_updated)
VALUES (?, ?, ?)
ON CONFLICT(user_id) DO UPDATE SET
    plan_data = excluded.plan_data,
    last_updated = excluded.last_updated;
";

        let plan_data = serde_json::to_string(&plan.readings)?;
        sqlx::query(SQL)
            .bind(&plan.user_id)
            .bind(plan_data)
            .bind(to_millis(plan.last_updated))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<ReadingPlan>, StoreError> {
        const SQL: &str = "
SELECT user_id, plan_data, last_updated
FROM offline_plans
WHERE user_id = ?;
";

        let record: Option<PlanRecord> = sqlx::query_as(SQL)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        record.map(TryInto::try_into).transpose()
    }

    pub async fn delete(&self, user_id: &str) -> Result<bool, StoreError> {
        const SQL: &str = "DELETE FROM offline_plans WHERE user_id = ?;";

        let result = sqlx::query(SQL).bind(user_id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRecord {
    user_id: String,
    plan_data: String,
    last_updated: i64,
}

impl TryFrom<PlanRecord> for ReadingPlan {
    type Error = StoreError;

    fn try_from(record: PlanRecord) -> Result<Self, Self::Error> {
        let readings: BTreeMap<Date, Vec<String>> = serde_json::from_str(&record.plan_data)?;
        Ok(ReadingPlan {
            user_id: record.user_id,
            readings,
            last_updated: from_millis(record.last_updated)?,
        })
    }
}
