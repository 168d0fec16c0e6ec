//! Cloud Firestore integration for the GoForCab shell
//!
//! This crate stores device token records in Cloud Firestore through the
//! Firestore v1 REST API.
//!
//! # Features
//!
//! - Authentication with a service account key file, or a static token for
//!   the Firestore emulator
//! - Equality queries on the `pushToken` field
//! - Create and merge writes with server-assigned `createdAt`/`updatedAt`
//!
//! # Example
//!
//! ```rust,no_run
//! use goforcab_config::FirebaseConfig;
//! use goforcab_firebase::{FirestoreClient, FirestoreDeviceTokenRepository};
//! use std::sync::Arc;
//!
//! async fn setup_store(
//!     config: &FirebaseConfig,
//! ) -> Result<FirestoreDeviceTokenRepository, Box<dyn std::error::Error>> {
//!     let client = Arc::new(FirestoreClient::new(config).await?);
//!     Ok(FirestoreDeviceTokenRepository::new(client, "deviceTokens"))
//! }
//! ```

pub mod auth;
pub mod client;
pub mod repository;

pub use auth::FirestoreAuth;
pub use client::{FirebaseError, FirestoreClient};
pub use repository::FirestoreDeviceTokenRepository;
