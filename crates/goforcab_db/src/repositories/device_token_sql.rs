//! SQL implementation of the device token repository
//!
//! Timestamps come from the database (`CURRENT_TIMESTAMP`) and are stored as
//! text, since `DateTime<Utc>` does not decode through `sqlx::Any`.

use crate::error::DbError;
use crate::repositories::device_token::{DeviceTokenFields, DeviceTokenRepository, WriteOptions};
use crate::DbClient;
use chrono::{DateTime, NaiveDateTime, Utc};
use goforcab_common::models::{DeviceTokenRecord, Platform};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info, warn};

/// SQL implementation of the device token repository
#[derive(Debug, Clone)]
pub struct SqlDeviceTokenRepository {
    db_client: DbClient,
}

impl SqlDeviceTokenRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    /// Create the `device_tokens` table and its push token index if missing
    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing device token schema");

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS device_tokens (
                record_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                push_token TEXT NOT NULL,
                platform TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
        "#,
            )
            .await?;

        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_device_tokens_push_token ON device_tokens (push_token)",
            )
            .await?;

        info!("Device token schema initialized successfully");
        Ok(())
    }

    async fn replace(&self, record_id: &str, fields: DeviceTokenFields) -> Result<(), DbError> {
        let record = fields.into_record(record_id).ok_or_else(|| {
            DbError::InvalidRecord(format!("full write of {} is missing fields", record_id))
        })?;

        let query = r#"
            INSERT INTO device_tokens (record_id, user_id, push_token, platform, created_at, updated_at)
            VALUES ($1, $2, $3, $4, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            ON CONFLICT (record_id) DO UPDATE SET
                user_id = excluded.user_id,
                push_token = excluded.push_token,
                platform = excluded.platform,
                updated_at = CURRENT_TIMESTAMP
        "#;

        sqlx::query(query)
            .bind(&record.record_id)
            .bind(&record.user_id)
            .bind(&record.push_token)
            .bind(record.platform.as_str())
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to write device token record: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(())
    }

    async fn merge(&self, record_id: &str, fields: DeviceTokenFields) -> Result<(), DbError> {
        let query = r#"
            UPDATE device_tokens
            SET user_id = COALESCE($1, user_id),
                push_token = COALESCE($2, push_token),
                platform = COALESCE($3, platform),
                updated_at = CURRENT_TIMESTAMP
            WHERE record_id = $4
        "#;

        let result = sqlx::query(query)
            .bind(fields.user_id.clone())
            .bind(fields.push_token.clone())
            .bind(fields.platform.map(|p| p.as_str().to_string()))
            .bind(record_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to merge device token record: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            debug!("Record {} not found for merge, inserting", record_id);
            return self.replace(record_id, fields).await;
        }

        Ok(())
    }
}

impl DeviceTokenRepository for SqlDeviceTokenRepository {
    type Error = DbError;

    async fn find_by_push_token(&self, push_token: &str) -> Result<Vec<DeviceTokenRecord>, DbError> {
        debug!("Finding device token records by push token");

        let query = r#"
            SELECT record_id, user_id, push_token, platform, created_at, updated_at
            FROM device_tokens
            WHERE push_token = $1
        "#;

        let rows = sqlx::query(query)
            .bind(push_token)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find device token records: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(record_from_row).collect()
    }

    async fn create_or_merge(
        &self,
        record_id: &str,
        fields: DeviceTokenFields,
        options: WriteOptions,
    ) -> Result<(), DbError> {
        if options.merge {
            self.merge(record_id, fields).await
        } else {
            self.replace(record_id, fields).await
        }
    }
}

fn record_from_row(row: &AnyRow) -> Result<DeviceTokenRecord, DbError> {
    let platform: String = row.try_get("platform")?;
    let platform = platform.parse::<Platform>().map_err(DbError::QueryError)?;

    Ok(DeviceTokenRecord {
        record_id: row.try_get("record_id")?,
        user_id: row.try_get("user_id")?,
        push_token: row.try_get("push_token")?,
        platform,
        created_at: parse_timestamp(row.try_get("created_at").ok()),
        updated_at: parse_timestamp(row.try_get("updated_at").ok()),
    })
}

fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Some(ts.with_timezone(&Utc));
    }
    // Postgres renders timestamptz as text with a short offset, e.g. `+00`
    if let Ok(ts) = DateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(ts.with_timezone(&Utc));
    }
    // SQLite's CURRENT_TIMESTAMP format
    match NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc()),
        Err(_) => {
            warn!("Unparseable timestamp in device_tokens: {}", raw);
            None
        }
    }
}
