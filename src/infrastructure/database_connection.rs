// Database connection and pool management
// Sqlite via sqlx; schema bootstrap happens in migrate().

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db_path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");

        // Sqlite will not create missing parent directories on its own.
        if db_path != ":memory:" {
            if let Some(parent) = Path::new(db_path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            if !Path::new(db_path).exists() {
                std::fs::File::create(db_path)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let create_dockets_sql = r#"
            CREATE TABLE IF NOT EXISTS dockets (
                incident_id INTEGER PRIMARY KEY,
                source_id INTEGER NOT NULL,
                class_code TEXT NOT NULL,
                unique_number TEXT NOT NULL DEFAULT '',
                channel_code INTEGER NOT NULL,
                visibility_code INTEGER NOT NULL,
                filed_date DATE NOT NULL,
                discovered_at DATE NOT NULL,
                class_label TEXT,
                parties TEXT,
                subjects TEXT,
                origin_court TEXT,
                origin_place TEXT,
                origin_numbers TEXT,
                enriched_at DATE
            )
        "#;

        let create_checkpoints_sql = r#"
            CREATE TABLE IF NOT EXISTS scan_checkpoints (
                class_code TEXT PRIMARY KEY,
                last_id INTEGER NOT NULL,
                checkpoint_date DATE NOT NULL
            )
        "#;

        let create_queue_sql = r#"
            CREATE TABLE IF NOT EXISTS enrichment_queue (
                incident_id INTEGER PRIMARY KEY,
                source_id INTEGER NOT NULL
            )
        "#;

        let create_indexes_sql = [
            "CREATE INDEX IF NOT EXISTS idx_dockets_class_code ON dockets (class_code)",
            "CREATE INDEX IF NOT EXISTS idx_dockets_source_id ON dockets (source_id)",
            "CREATE INDEX IF NOT EXISTS idx_checkpoints_last_id ON scan_checkpoints (last_id)",
        ];

        sqlx::query(create_dockets_sql).execute(&self.pool).await?;
        sqlx::query(create_checkpoints_sql)
            .execute(&self.pool)
            .await?;
        sqlx::query(create_queue_sql).execute(&self.pool).await?;
        for sql in create_indexes_sql {
            sqlx::query(sql).execute(&self.pool).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_connection_and_migration() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("test.db");
        let database_url = format!("sqlite:{}", db_path.display());

        let db = DatabaseConnection::new(&database_url).await?;
        db.migrate().await?;

        for table in ["dockets", "scan_checkpoints", "enrichment_queue"] {
            let row = sqlx::query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name = ?",
            )
            .bind(table)
            .fetch_optional(db.pool())
            .await?;
            assert!(row.is_some(), "missing table {table}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_migration_is_rerunnable() -> Result<()> {
        let temp_dir = tempdir()?;
        let database_url = format!("sqlite:{}", temp_dir.path().join("rerun.db").display());

        let db = DatabaseConnection::new(&database_url).await?;
        db.migrate().await?;
        db.migrate().await?;
        Ok(())
    }
}
