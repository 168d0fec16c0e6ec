//! Firestore-backed device token repository
//!
//! Records live in one collection, one document per record id, with the
//! fields `userId`, `pushToken`, `platform`, `createdAt` and `updatedAt`.
//! Timestamps are set by Firestore (`REQUEST_TIME` transforms).

use crate::client::{string_value, Document, DocumentWrite, FirebaseError, FirestoreClient};
use chrono::{DateTime, Utc};
use goforcab_common::models::{DeviceTokenRecord, Platform};
use goforcab_db::{DeviceTokenFields, DeviceTokenRepository, WriteOptions};
use serde_json::Map;
use std::sync::Arc;
use tracing::debug;

/// Repository for device token records stored in Cloud Firestore
#[derive(Debug, Clone)]
pub struct FirestoreDeviceTokenRepository {
    client: Arc<FirestoreClient>,
    collection: String,
}

impl FirestoreDeviceTokenRepository {
    /// Create a repository over `collection`
    pub fn new(client: Arc<FirestoreClient>, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl DeviceTokenRepository for FirestoreDeviceTokenRepository {
    type Error = FirebaseError;

    async fn find_by_push_token(
        &self,
        push_token: &str,
    ) -> Result<Vec<DeviceTokenRecord>, FirebaseError> {
        let documents = self
            .client
            .query_equals(&self.collection, "pushToken", string_value(push_token))
            .await?;

        debug!(
            "Found {} document(s) in {} for push token",
            documents.len(),
            self.collection
        );
        documents.iter().map(record_from_document).collect()
    }

    async fn create_or_merge(
        &self,
        record_id: &str,
        fields: DeviceTokenFields,
        options: WriteOptions,
    ) -> Result<(), FirebaseError> {
        let update_mask = options
            .merge
            .then(|| fields.field_paths().into_iter().map(String::from).collect());

        let server_timestamps = if options.merge {
            vec!["updatedAt".to_string()]
        } else {
            vec!["createdAt".to_string(), "updatedAt".to_string()]
        };

        let write = DocumentWrite {
            collection: self.collection.clone(),
            document_id: record_id.to_string(),
            fields: encode_fields(&fields),
            update_mask,
            server_timestamps,
        };

        self.client.commit(&[write]).await
    }
}

fn encode_fields(fields: &DeviceTokenFields) -> Map<String, serde_json::Value> {
    let mut encoded = Map::new();
    if let Some(user_id) = &fields.user_id {
        encoded.insert("userId".to_string(), string_value(user_id));
    }
    if let Some(push_token) = &fields.push_token {
        encoded.insert("pushToken".to_string(), string_value(push_token));
    }
    if let Some(platform) = fields.platform {
        encoded.insert("platform".to_string(), string_value(platform.as_str()));
    }
    encoded
}

fn record_from_document(document: &Document) -> Result<DeviceTokenRecord, FirebaseError> {
    let required = |field: &str| {
        document
            .string_field(field)
            .map(str::to_string)
            .ok_or_else(|| {
                FirebaseError::DecodeError(format!("{} has no string field {}", document.name, field))
            })
    };

    let platform = required("platform")?
        .parse::<Platform>()
        .map_err(FirebaseError::DecodeError)?;

    Ok(DeviceTokenRecord {
        record_id: document.id().to_string(),
        user_id: required("userId")?,
        push_token: required("pushToken")?,
        platform,
        created_at: parse_timestamp(document.timestamp_field("createdAt")),
        updated_at: parse_timestamp(document.timestamp_field("updatedAt")),
    })
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw?)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
