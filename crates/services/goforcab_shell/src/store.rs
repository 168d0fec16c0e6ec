// --- File: crates/services/goforcab_shell/src/store.rs ---

// Builds the configured device token store.

use goforcab_common::{database_error, log_result, GoforcabError};
use goforcab_config::AppConfig;
use goforcab_db::{DbClient, SqlDeviceTokenRepository};
use tracing::{info, warn};

#[cfg(feature = "firebase")]
use {
    goforcab_common::{config_error, external_service_error},
    goforcab_firebase::{FirestoreClient, FirestoreDeviceTokenRepository},
    std::sync::Arc,
};

/// SQL store from the `database` section, with its schema in place
pub async fn sql_store(config: &AppConfig) -> Result<SqlDeviceTokenRepository, GoforcabError> {
    let client = DbClient::new(config).await.map_err(database_error)?;
    if !client.is_healthy().await {
        warn!("Database did not answer the health check");
    }

    let repository = SqlDeviceTokenRepository::new(client);
    log_result(
        repository.init_schema().await,
        "Using SQL device token store",
        "Failed to prepare device token schema",
    )
    .map_err(database_error)?;

    Ok(repository)
}

/// Firestore store from the `firebase` section
#[cfg(feature = "firebase")]
pub async fn firestore_store(config: &AppConfig) -> Result<FirestoreDeviceTokenRepository, GoforcabError> {
    let firebase = config
        .firebase
        .as_ref()
        .ok_or_else(|| config_error("store.backend is firestore but [firebase] is missing"))?;
    let client = FirestoreClient::new(firebase)
        .await
        .map_err(|e| external_service_error("firestore", e))?;

    info!("Using Firestore collection {}", config.store.collection);
    Ok(FirestoreDeviceTokenRepository::new(
        Arc::new(client),
        config.store.collection.clone(),
    ))
}
