// SQLite StateStore Implementation

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use benchpress_core::domain::StateRecord;
use benchpress_core::error::{Result, WorkloadError};
use benchpress_core::port::StateStore;

// Helper to convert sqlx::Error to WorkloadError with structured information
fn map_sqlx_error(err: sqlx::Error) -> WorkloadError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();
                match code_str {
                    "5" => {
                        // SQLITE_BUSY - database is locked
                        WorkloadError::State(format!(
                            "database locked (SQLITE_BUSY): {}",
                            db_err.message()
                        ))
                    }
                    "13" => {
                        // SQLITE_FULL - database or disk is full
                        WorkloadError::State(format!("database full: {}", db_err.message()))
                    }
                    _ => WorkloadError::State(format!(
                        "database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                WorkloadError::State(format!("database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => WorkloadError::State("row not found".to_string()),
        _ => WorkloadError::State(err.to_string()),
    }
}

/// Whole-record persistence of workload state in a `workload_state` table.
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn get(&self, name: &str) -> Result<Option<StateRecord>> {
        let row = sqlx::query("SELECT properties FROM workload_state WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("properties").map_err(map_sqlx_error)?;
                let properties: serde_json::Map<String, serde_json::Value> =
                    serde_json::from_str(&raw)?;
                Ok(Some(StateRecord {
                    name: name.to_string(),
                    properties,
                }))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, record: &StateRecord) -> Result<()> {
        let properties = serde_json::to_string(&record.properties)?;

        sqlx::query(
            r#"
            INSERT INTO workload_state (name, properties, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                properties = excluded.properties,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.name)
        .bind(properties)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(workload = %record.name, "Saved workload state record");
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        sqlx::query("DELETE FROM workload_state WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        debug!(workload = %name, "Deleted workload state record");
        Ok(())
    }
}
