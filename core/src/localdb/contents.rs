// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use sqlx::SqlitePool;

use crate::error::StoreError;
use crate::localdb::{from_millis, to_millis};
use crate::types::CachedContent;

/// Chapter text cached for offline reading.
#[derive(Debug, Clone)]
pub struct Contents {
    pool: SqlitePool,
}

impl Contents {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn put(&self, content: &CachedContent) -> Result<(), StoreError> {
        const SQL: &str = "
INSERT INTO cached_content (book_name, chapter, content, cached_at)
VALUES (?, ?, ?, ?)
ON CONFLICT(book_name, chapter) DO UPDATE SET
    content = excluded.content,
    cached_at = excluded.cached_at;
";

        sqlx::query(SQL)
            .bind(&content.book_name)
            .bind(content.chapter)
            .bind(&content.content)
            .bind(to_millis(content.cached_at))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get(
        &self,
        book_name: &str,
        chapter: u32,
    ) -> Result<Option<CachedContent>, StoreError> {
        const SQL: &str = "
SELECT book_name, chapter, content, cached_at
FROM cached_content
WHERE book_name = ? AND chapter = ?;
";

        let record: Option<ContentRecord> = sqlx::query_as(SQL)
            .bind(book_name)
            .bind(chapter)
            .fetch_optional(&self.pool)
            .await?;

        record.map(TryInto::try_into).transpose()
    }

    /// Deletes entries cached before `cutoff` (unix milliseconds).
    pub(crate) async fn delete_cached_before(&self, cutoff: i64) -> Result<u64, StoreError> {
        const SQL: &str = "DELETE FROM cached_content WHERE cached_at < ?;";

        let result = sqlx::query(SQL).bind(cutoff).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ContentRecord {
    book_name: String,
    chapter: u32,
    content: String,
    cached_at: i64,
}

impl TryFrom<ContentRecord> for CachedContent {
    type Error = StoreError;

    fn try_from(record: ContentRecord) -> Result<Self, Self::Error> {
        Ok(CachedContent {
            book_name: record.book_name,
            chapter: record.chapter,
            content: record.content,
            cached_at: from_millis(record.cached_at)?,
        })
    }
}
