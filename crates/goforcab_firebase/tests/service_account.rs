// A service account key is read once; the token it mints is reused across
// Firestore requests.

use goforcab_common::models::Platform;
use goforcab_config::FirebaseConfig;
use goforcab_db::{DeviceTokenFields, DeviceTokenRepository, WriteOptions};
use goforcab_firebase::{FirebaseError, FirestoreAuth, FirestoreClient, FirestoreDeviceTokenRepository};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROOT: &str = "/v1/projects/goforcab-test/databases/(default)/documents";
const PRIVATE_KEY: &str = include_str!("fixtures/test_service_account.pem");

fn write_key_file(server: &MockServer, name: &str) -> PathBuf {
    let key = json!({
        "type": "service_account",
        "project_id": "goforcab-test",
        "private_key_id": "test-key",
        "private_key": PRIVATE_KEY,
        "client_email": "shell@goforcab-test.iam.gserviceaccount.com",
        "client_id": "1",
        "auth_uri": format!("{}/auth", server.uri()),
        "token_uri": format!("{}/token", server.uri()),
    });
    let path = std::env::temp_dir().join(format!(
        "goforcab-sa-{}-{}.json",
        name,
        std::process::id()
    ));
    std::fs::write(&path, key.to_string()).unwrap();
    path
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.shell-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_token_is_fetched_once_per_process() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", ROOT)))
        .and(header("authorization", "Bearer ya29.shell-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "readTime": "2024-05-01T10:00:01Z" }])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}:commit", ROOT)))
        .and(header("authorization", "Bearer ya29.shell-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{ "updateTime": "2024-05-01T10:00:00Z" }],
            "commitTime": "2024-05-01T10:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let key_path = write_key_file(&server, "upsert");
    let config = FirebaseConfig {
        project_id: Some("goforcab-test".to_string()),
        base_url: Some(server.uri()),
        key_path: Some(key_path.display().to_string()),
        ..FirebaseConfig::default()
    };
    let client = Arc::new(FirestoreClient::new(&config).await.unwrap());
    let repository = FirestoreDeviceTokenRepository::new(client, "deviceTokens");

    // One upsert: query, then create
    assert!(repository.find_by_push_token("tok-1").await.unwrap().is_empty());
    repository
        .create_or_merge(
            "r1",
            DeviceTokenFields::new_record("tok-1", "guest", Platform::Android),
            WriteOptions::replace(),
        )
        .await
        .unwrap();

    let _ = std::fs::remove_file(key_path);
}

#[tokio::test]
async fn test_bearer_token_reuses_cached_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let key_path = write_key_file(&server, "cache");
    let auth = FirestoreAuth::service_account(&key_path.display().to_string())
        .await
        .unwrap();

    assert_eq!(auth.bearer_token().await.unwrap(), "ya29.shell-token");
    assert_eq!(auth.bearer_token().await.unwrap(), "ya29.shell-token");

    let _ = std::fs::remove_file(key_path);
}

#[tokio::test]
async fn test_unreadable_key_file() {
    let result = FirestoreAuth::service_account("/nonexistent/sa.json").await;
    assert!(matches!(result, Err(FirebaseError::AuthError(_))));
}
