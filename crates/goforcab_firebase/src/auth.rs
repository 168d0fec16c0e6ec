//! Authentication for the Firestore REST API
//!
//! Requests carry an OAuth2 bearer token. In production the token is minted
//! from a service account key file; against the Firestore emulator a static
//! token (`owner`) is enough.

use crate::client::FirebaseError;
use goforcab_config::FirebaseConfig;
use std::{fmt, path::Path, sync::Arc};
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator};

/// OAuth2 scope granting read/write access to Cloud Firestore
pub const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Where bearer tokens for Firestore requests come from
#[derive(Clone)]
pub enum FirestoreAuth {
    /// A fixed token, e.g. `owner` for the emulator
    Static(String),
    /// Authenticator built from a service account key file. It caches tokens
    /// and refreshes them before they expire.
    ServiceAccount(Arc<DefaultAuthenticator>),
}

impl fmt::Debug for FirestoreAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(_) => f.write_str("FirestoreAuth::Static"),
            Self::ServiceAccount(_) => f.write_str("FirestoreAuth::ServiceAccount"),
        }
    }
}

impl FirestoreAuth {
    /// Pick the token source from configuration
    ///
    /// A static `access_token` wins over `key_path`. The key file is read
    /// once, here.
    pub async fn from_config(config: &FirebaseConfig) -> Result<Self, FirebaseError> {
        if let Some(token) = config.access_token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(Self::Static(token.to_string()));
        }
        match config.key_path.as_deref().filter(|p| !p.is_empty()) {
            Some(key_path) => Self::service_account(key_path).await,
            None => Err(FirebaseError::ConfigError(
                "Missing key_path or access_token in FirebaseConfig".to_string(),
            )),
        }
    }

    /// Build a service account authenticator from a key file
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the key file cannot be read or parsed.
    pub async fn service_account(key_path: &str) -> Result<Self, FirebaseError> {
        let sa_key = read_service_account_key(Path::new(key_path))
            .await
            .map_err(|e| FirebaseError::AuthError(format!("{}: {}", key_path, e)))?;

        let auth = ServiceAccountAuthenticator::builder(sa_key)
            .build()
            .await
            .map_err(|e| FirebaseError::AuthError(e.to_string()))?;

        Ok(Self::ServiceAccount(Arc::new(auth)))
    }

    /// Get a bearer token for the next request
    pub async fn bearer_token(&self) -> Result<String, FirebaseError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::ServiceAccount(auth) => {
                let access_token = auth
                    .token(&[FIRESTORE_SCOPE])
                    .await
                    .map_err(|e| FirebaseError::AuthError(e.to_string()))?;
                access_token
                    .token()
                    .map(str::to_string)
                    .ok_or_else(|| FirebaseError::AuthError("No token available".to_string()))
            }
        }
    }
}
