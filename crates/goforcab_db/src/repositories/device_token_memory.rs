//! In-memory device token store
//!
//! Keeps records in a process-local map. Used by the `memory` backend and by
//! tests that need to count writes.

use crate::error::DbError;
use crate::repositories::device_token::{DeviceTokenFields, DeviceTokenRepository, WriteOptions};
use chrono::Utc;
use goforcab_common::models::DeviceTokenRecord;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// In-memory implementation of the device token repository
///
/// Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryDeviceTokenRepository {
    records: Arc<Mutex<BTreeMap<String, DeviceTokenRecord>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryDeviceTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record as if a previous process had written it
    pub fn insert(&self, record: DeviceTokenRecord) -> Result<(), DbError> {
        self.lock()?.insert(record.record_id.clone(), record);
        Ok(())
    }

    /// All stored records, ordered by record id
    pub fn records(&self) -> Result<Vec<DeviceTokenRecord>, DbError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    /// Look up a record by id
    pub fn get(&self, record_id: &str) -> Result<Option<DeviceTokenRecord>, DbError> {
        Ok(self.lock()?.get(record_id).cloned())
    }

    /// Number of successful `create_or_merge` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, DeviceTokenRecord>>, DbError> {
        self.records
            .lock()
            .map_err(|e| DbError::Other(format!("record map poisoned: {}", e)))
    }
}

impl DeviceTokenRepository for MemoryDeviceTokenRepository {
    type Error = DbError;

    async fn find_by_push_token(&self, push_token: &str) -> Result<Vec<DeviceTokenRecord>, DbError> {
        let records = self.lock()?;
        Ok(records
            .values()
            .filter(|record| record.push_token == push_token)
            .cloned()
            .collect())
    }

    async fn create_or_merge(
        &self,
        record_id: &str,
        fields: DeviceTokenFields,
        options: WriteOptions,
    ) -> Result<(), DbError> {
        let now = Utc::now();
        let mut records = self.lock()?;

        match records.get_mut(record_id).filter(|_| options.merge) {
            Some(existing) => {
                debug!("Merging into device token record {}", record_id);
                if let Some(user_id) = fields.user_id {
                    existing.user_id = user_id;
                }
                if let Some(push_token) = fields.push_token {
                    existing.push_token = push_token;
                }
                if let Some(platform) = fields.platform {
                    existing.platform = platform;
                }
                existing.updated_at = Some(now);
            }
            None => {
                debug!("Writing device token record {}", record_id);
                let mut record = fields.into_record(record_id).ok_or_else(|| {
                    DbError::InvalidRecord(format!(
                        "record {} does not exist and the write is incomplete",
                        record_id
                    ))
                })?;
                record.created_at = Some(now);
                record.updated_at = Some(now);
                records.insert(record_id.to_string(), record);
            }
        }

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
