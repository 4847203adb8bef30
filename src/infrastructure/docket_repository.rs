//! Repository for dockets, detail fields, and the enrichment queue
//!
//! The sqlite store is the single source of truth shared by every worker;
//! concurrency correctness reduces to per-statement atomicity here. Every
//! discovery write is an idempotent upsert keyed on `incident_id`, the
//! queue insert dedups on the same key, and the detail write plus queue
//! removal share one transaction so a half-finished enrichment leaves the
//! entry queued for the next pass.

use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::domain::docket::{ChannelKind, DetailFields, DocketRecord, QueueEntry, VisibilityKind};
use crate::domain::error::CrawlResult;

#[derive(Clone)]
pub struct DocketRepository {
    pool: Arc<SqlitePool>,
}

impl DocketRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Insert a newly discovered docket, or refresh `discovered_at` when the
    /// incident is already known. Discovery-time columns are never
    /// overwritten on conflict - they were already correct the first time.
    pub async fn upsert_discovered(&self, record: &DocketRecord) -> CrawlResult<()> {
        sqlx::query(
            r#"
            INSERT INTO dockets (
                incident_id, source_id, class_code, unique_number,
                channel_code, visibility_code, filed_date, discovered_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(incident_id) DO UPDATE
            SET discovered_at = excluded.discovered_at
            "#,
        )
        .bind(record.incident_id)
        .bind(record.source_id)
        .bind(&record.class_code)
        .bind(&record.unique_number)
        .bind(record.channel.as_code())
        .bind(record.visibility.as_code())
        .bind(record.filed_date)
        .bind(record.discovered_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    /// Stage an incident for enrichment. Re-enqueueing an already staged
    /// incident is a no-op.
    pub async fn enqueue(&self, incident_id: i64, source_id: i64) -> CrawlResult<()> {
        sqlx::query("INSERT OR IGNORE INTO enrichment_queue (incident_id, source_id) VALUES (?, ?)")
            .bind(incident_id)
            .bind(source_id)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    /// Attach detail fields and remove the queue entry in one transaction.
    ///
    /// The overwrite of the detail columns is total, so re-enriching a
    /// completed docket is safe; if the commit fails the entry stays queued
    /// and the next drain pass retries it.
    pub async fn write_details(
        &self,
        incident_id: i64,
        details: &DetailFields,
        enriched_at: NaiveDate,
    ) -> CrawlResult<()> {
        let parties = serde_json::to_string(&details.parties)?;
        let subjects = serde_json::to_string(&details.subjects)?;
        let origin_numbers = serde_json::to_string(&details.origin_numbers)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE dockets
            SET class_label = ?, parties = ?, subjects = ?,
                origin_court = ?, origin_place = ?, origin_numbers = ?,
                enriched_at = ?
            WHERE incident_id = ?
            "#,
        )
        .bind(&details.class_label)
        .bind(parties)
        .bind(subjects)
        .bind(&details.origin_court)
        .bind(&details.origin_place)
        .bind(origin_numbers)
        .bind(enriched_at)
        .bind(incident_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM enrichment_queue WHERE incident_id = ?")
            .bind(incident_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// All incidents still awaiting enrichment.
    pub async fn select_incomplete(&self) -> CrawlResult<Vec<QueueEntry>> {
        let rows = sqlx::query(
            "SELECT incident_id, source_id FROM enrichment_queue ORDER BY incident_id",
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| QueueEntry {
                incident_id: row.get("incident_id"),
                source_id: row.get("source_id"),
            })
            .collect())
    }

    pub async fn get_docket(&self, incident_id: i64) -> CrawlResult<Option<DocketRecord>> {
        let row = sqlx::query(
            r#"
            SELECT incident_id, source_id, class_code, unique_number,
                   channel_code, visibility_code, filed_date, discovered_at
            FROM dockets WHERE incident_id = ?
            "#,
        )
        .bind(incident_id)
        .fetch_optional(&*self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(DocketRecord {
                incident_id: row.get("incident_id"),
                source_id: row.get("source_id"),
                class_code: row.get("class_code"),
                unique_number: row.get("unique_number"),
                channel: ChannelKind::from_code(row.get("channel_code"))?,
                visibility: VisibilityKind::from_code(row.get("visibility_code"))?,
                filed_date: row.get("filed_date"),
                discovered_at: row.get("discovered_at"),
            })),
            None => Ok(None),
        }
    }

    /// Detail fields for a docket, when it has been enriched.
    pub async fn get_details(&self, incident_id: i64) -> CrawlResult<Option<DetailFields>> {
        let row = sqlx::query(
            r#"
            SELECT class_label, parties, subjects, origin_court, origin_place, origin_numbers
            FROM dockets WHERE incident_id = ? AND enriched_at IS NOT NULL
            "#,
        )
        .bind(incident_id)
        .fetch_optional(&*self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(DetailFields {
                class_label: row.get::<Option<String>, _>("class_label").unwrap_or_default(),
                parties: serde_json::from_str(
                    &row.get::<Option<String>, _>("parties").unwrap_or_else(|| "[]".into()),
                )?,
                subjects: serde_json::from_str(
                    &row.get::<Option<String>, _>("subjects").unwrap_or_else(|| "[]".into()),
                )?,
                origin_court: row.get::<Option<String>, _>("origin_court").unwrap_or_default(),
                origin_place: row.get::<Option<String>, _>("origin_place").unwrap_or_default(),
                origin_numbers: serde_json::from_str(
                    &row.get::<Option<String>, _>("origin_numbers")
                        .unwrap_or_else(|| "[]".into()),
                )?,
            })),
            None => Ok(None),
        }
    }

    pub async fn count_dockets(&self) -> CrawlResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM dockets")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get("n"))
    }
}
