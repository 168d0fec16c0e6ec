//! Repository contract for device token records
//!
//! This module defines the two operations the reconciler needs from a remote
//! keyed-record store: an equality query on the push token and a
//! create-or-merge write addressed by record id. The SQL, in-memory and
//! Firestore stores all implement it.

use goforcab_common::models::{DeviceTokenRecord, Platform};
use std::future::Future;

/// Fields carried by a write.
///
/// `None` means "leave the stored value alone" for merge writes. A full
/// (non-merge) write requires every field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceTokenFields {
    pub user_id: Option<String>,
    pub push_token: Option<String>,
    pub platform: Option<Platform>,
}

impl DeviceTokenFields {
    /// Every field of a brand new record
    pub fn new_record(push_token: &str, user_id: &str, platform: Platform) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            push_token: Some(push_token.to_string()),
            platform: Some(platform),
        }
    }

    /// Only the owning user, for re-association writes
    pub fn user_only(user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            ..Self::default()
        }
    }

    /// Names of the fields present, in store (camelCase) spelling
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.user_id.is_some() {
            paths.push("userId");
        }
        if self.push_token.is_some() {
            paths.push("pushToken");
        }
        if self.platform.is_some() {
            paths.push("platform");
        }
        paths
    }

    /// Build the full record for a non-merge write
    pub fn into_record(self, record_id: &str) -> Option<DeviceTokenRecord> {
        Some(DeviceTokenRecord::new(
            record_id,
            self.user_id?,
            self.push_token?,
            self.platform?,
        ))
    }
}

/// Options for `create_or_merge`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Merge into an existing record instead of replacing it.
    ///
    /// A merge write refreshes `updated_at` only; a replacing write assigns
    /// both `created_at` and `updated_at`.
    pub merge: bool,
}

impl WriteOptions {
    pub fn merge() -> Self {
        Self { merge: true }
    }

    pub fn replace() -> Self {
        Self { merge: false }
    }
}

/// Store holding one `DeviceTokenRecord` per push token
///
/// Timestamps are assigned by the store, never by the caller.
pub trait DeviceTokenRepository: Send + Sync {
    /// Error type returned by the store
    type Error: std::error::Error + Send + Sync + 'static;

    /// Find every record whose push token equals `push_token`
    ///
    /// In steady state this returns zero or one record.
    fn find_by_push_token(
        &self,
        push_token: &str,
    ) -> impl Future<Output = Result<Vec<DeviceTokenRecord>, Self::Error>> + Send;

    /// Create the record `record_id` or merge `fields` into it
    ///
    /// # Arguments
    ///
    /// * `record_id` - The record to write
    /// * `fields` - The fields to write
    /// * `options` - Whether to merge into or replace an existing record
    fn create_or_merge(
        &self,
        record_id: &str,
        fields: DeviceTokenFields,
        options: WriteOptions,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_paths() {
        assert_eq!(
            DeviceTokenFields::new_record("t", "guest", Platform::Android).field_paths(),
            vec!["userId", "pushToken", "platform"]
        );
        assert_eq!(DeviceTokenFields::user_only("u1").field_paths(), vec!["userId"]);
    }

    #[test]
    fn test_into_record_requires_all_fields() {
        assert!(DeviceTokenFields::user_only("u1").into_record("r1").is_none());

        let record = DeviceTokenFields::new_record("t", "u1", Platform::Web)
            .into_record("r1")
            .unwrap();
        assert_eq!(record.record_id, "r1");
        assert_eq!(record.push_token, "t");
        assert_eq!(record.platform, Platform::Web);
    }
}
