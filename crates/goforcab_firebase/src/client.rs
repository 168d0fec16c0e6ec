//! Cloud Firestore REST client
//!
//! A small client for the two Firestore v1 endpoints the device token store
//! needs: `documents:runQuery` for equality queries and `documents:commit` for
//! create/merge writes with server-assigned timestamps.

use crate::auth::FirestoreAuth;
use goforcab_config::FirebaseConfig;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, error};

/// Public Firestore endpoint
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";

/// Database used when the configuration names none
pub const DEFAULT_DATABASE_ID: &str = "(default)";

/// Errors that can occur when talking to Firestore
#[derive(Error, Debug)]
pub enum FirebaseError {
    /// Error during authentication
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error during the HTTP request
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Missing required configuration
    #[error("Missing configuration: {0}")]
    ConfigError(String),

    /// Error returned by the Firestore API
    #[error("Firestore API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// A document could not be mapped to a record
    #[error("Malformed document: {0}")]
    DecodeError(String),
}

/// A Firestore document as returned by the REST API
///
/// Field values keep their typed wrapper, e.g. `{"stringValue": "abc"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// Last path segment of the document name
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn string_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field)?.get("stringValue")?.as_str()
    }

    pub fn timestamp_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field)?.get("timestampValue")?.as_str()
    }
}

/// Wrap a string in Firestore's typed value form
pub fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryResponseItem {
    document: Option<Document>,
}

/// A single write inside a commit
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentWrite {
    pub collection: String,
    pub document_id: String,
    pub fields: Map<String, Value>,
    /// When set, only these fields are written (merge); otherwise the
    /// document is replaced.
    pub update_mask: Option<Vec<String>>,
    /// Fields set to the server's request time.
    pub server_timestamps: Vec<String>,
}

/// Client for the Firestore REST API
#[derive(Debug, Clone)]
pub struct FirestoreClient {
    client: Client,
    base_url: String,
    project_id: String,
    database_id: String,
    auth: FirestoreAuth,
}

impl FirestoreClient {
    /// Creates a new client from the `firebase` configuration section
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the project id or credentials are missing.
    pub async fn new(config: &FirebaseConfig) -> Result<Self, FirebaseError> {
        let project_id = config
            .project_id
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                FirebaseError::ConfigError("Missing project_id in FirebaseConfig".to_string())
            })?;

        Ok(Self {
            client: Client::new(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            project_id,
            database_id: config
                .database_id
                .clone()
                .unwrap_or_else(|| DEFAULT_DATABASE_ID.to_string()),
            auth: FirestoreAuth::from_config(config).await?,
        })
    }

    /// Resource name of the documents root, e.g.
    /// `projects/p/databases/(default)/documents`
    pub fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }

    /// Full resource name of a document
    pub fn document_name(&self, collection: &str, document_id: &str) -> String {
        format!("{}/{}/{}", self.documents_root(), collection, document_id)
    }

    /// Run an equality query `field == value` over a collection
    pub async fn query_equals(
        &self,
        collection: &str,
        field: &str,
        value: Value,
    ) -> Result<Vec<Document>, FirebaseError> {
        let url = format!("{}/v1/{}:runQuery", self.base_url, self.documents_root());
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": value,
                    }
                }
            }
        });

        debug!("Querying {} where {} == ?", collection, field);
        let items: Vec<RunQueryResponseItem> = self.post(&url, &body).await?;

        // Items without a document only carry a read time
        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }

    /// Commit a set of writes atomically
    pub async fn commit(&self, writes: &[DocumentWrite]) -> Result<(), FirebaseError> {
        let url = format!("{}/v1/{}:commit", self.base_url, self.documents_root());

        let writes: Vec<Value> = writes.iter().map(|w| self.encode_write(w)).collect();
        let body = json!({ "writes": writes });

        let _: Value = self.post(&url, &body).await?;
        Ok(())
    }

    fn encode_write(&self, write: &DocumentWrite) -> Value {
        let mut encoded = Map::new();
        encoded.insert(
            "update".to_string(),
            json!({
                "name": self.document_name(&write.collection, &write.document_id),
                "fields": write.fields,
            }),
        );
        if let Some(mask) = &write.update_mask {
            encoded.insert("updateMask".to_string(), json!({ "fieldPaths": mask }));
        }
        if !write.server_timestamps.is_empty() {
            let transforms: Vec<Value> = write
                .server_timestamps
                .iter()
                .map(|field| json!({ "fieldPath": field, "setToServerValue": "REQUEST_TIME" }))
                .collect();
            encoded.insert("updateTransforms".to_string(), Value::Array(transforms));
        }
        Value::Object(encoded)
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<T, FirebaseError> {
        let token = self.auth.bearer_token().await?;

        let response = self
            .client
            .post(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await?;
            error!("Firestore returned {}: {}", status, message);
            return Err(FirebaseError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emulator_config() -> FirebaseConfig {
        FirebaseConfig {
            project_id: Some("goforcab-test".to_string()),
            base_url: Some("http://localhost:8080/".to_string()),
            access_token: Some("owner".to_string()),
            ..FirebaseConfig::default()
        }
    }

    #[tokio::test]
    async fn test_missing_project_id() {
        let config = FirebaseConfig {
            access_token: Some("owner".to_string()),
            ..FirebaseConfig::default()
        };
        assert!(matches!(
            FirestoreClient::new(&config).await,
            Err(FirebaseError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_document_name() {
        let client = FirestoreClient::new(&emulator_config()).await.unwrap();
        assert_eq!(
            client.document_name("deviceTokens", "abc"),
            "projects/goforcab-test/databases/(default)/documents/deviceTokens/abc"
        );
    }

    #[tokio::test]
    async fn test_merge_write_encoding() {
        let client = FirestoreClient::new(&emulator_config()).await.unwrap();
        let mut fields = Map::new();
        fields.insert("userId".to_string(), string_value("u1"));

        let encoded = client.encode_write(&DocumentWrite {
            collection: "deviceTokens".to_string(),
            document_id: "abc".to_string(),
            fields,
            update_mask: Some(vec!["userId".to_string()]),
            server_timestamps: vec!["updatedAt".to_string()],
        });

        assert_eq!(encoded["update"]["fields"]["userId"]["stringValue"], "u1");
        assert_eq!(encoded["updateMask"]["fieldPaths"][0], "userId");
        assert_eq!(encoded["updateTransforms"][0]["fieldPath"], "updatedAt");
        assert_eq!(
            encoded["updateTransforms"][0]["setToServerValue"],
            "REQUEST_TIME"
        );
    }

    #[test]
    fn test_document_accessors() {
        let document: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/deviceTokens/r1",
            "fields": {
                "userId": { "stringValue": "guest" },
                "createdAt": { "timestampValue": "2024-05-01T10:00:00Z" }
            }
        }))
        .unwrap();

        assert_eq!(document.id(), "r1");
        assert_eq!(document.string_field("userId"), Some("guest"));
        assert_eq!(document.string_field("createdAt"), None);
        assert_eq!(
            document.timestamp_field("createdAt"),
            Some("2024-05-01T10:00:00Z")
        );
    }
}
