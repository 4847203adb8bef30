//! Checkpoint store
//!
//! Per-class high-water marks over the scanned id space. `advance` is a
//! max-preserving conditional upsert, so racing workers on the same class
//! always leave the maximum candidate behind and a checkpoint never moves
//! backwards.

use chrono::{NaiveDate, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::domain::docket::ScanMode;
use crate::domain::error::CrawlResult;

/// Sentinel returned when no checkpoint exists yet: scanning starts at id 1.
pub const EMPTY_CHECKPOINT: i64 = 1;

#[derive(Clone)]
pub struct CheckpointRepository {
    pool: Arc<SqlitePool>,
}

impl CheckpointRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Raise the checkpoint for a class to `candidate_id` if that is higher
    /// than the stored value. Returns whether anything changed.
    pub async fn advance(&self, class_code: &str, candidate_id: i64) -> CrawlResult<bool> {
        let today: NaiveDate = Utc::now().date_naive();
        let result = sqlx::query(
            r#"
            INSERT INTO scan_checkpoints (class_code, last_id, checkpoint_date)
            VALUES (?, ?, ?)
            ON CONFLICT(class_code) DO UPDATE
            SET last_id = excluded.last_id,
                checkpoint_date = excluded.checkpoint_date
            WHERE excluded.last_id > scan_checkpoints.last_id
            "#,
        )
        .bind(class_code)
        .bind(candidate_id)
        .bind(today)
        .execute(&*self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Read the resume point for a scan mode. An empty table or an unknown
    /// class reads as [`EMPTY_CHECKPOINT`]; that is not an error.
    pub async fn read(&self, mode: &ScanMode) -> CrawlResult<i64> {
        let row = match mode {
            ScanMode::Highest => {
                sqlx::query("SELECT last_id FROM scan_checkpoints ORDER BY last_id DESC LIMIT 1")
                    .fetch_optional(&*self.pool)
                    .await?
            }
            ScanMode::Lowest => {
                sqlx::query("SELECT last_id FROM scan_checkpoints ORDER BY last_id ASC LIMIT 1")
                    .fetch_optional(&*self.pool)
                    .await?
            }
            ScanMode::Category(class_code) => {
                sqlx::query("SELECT last_id FROM scan_checkpoints WHERE class_code = ?")
                    .bind(class_code)
                    .fetch_optional(&*self.pool)
                    .await?
            }
        };

        Ok(row
            .map(|row| row.get::<i64, _>("last_id"))
            .unwrap_or(EMPTY_CHECKPOINT))
    }
}
