//! Device token record stores for the GoForCab shell
//!
//! This crate defines the keyed-record store contract used by the device
//! token reconciler and provides two implementations of it: a SQL store on
//! top of SQLx's `Any` driver (SQLite, PostgreSQL or MySQL through feature
//! flags) and a process-local in-memory store.
//!
//! # Example
//!
//! ```rust,no_run
//! use goforcab_db::{DbClient, SqlDeviceTokenRepository};
//!
//! async fn setup_store() -> Result<SqlDeviceTokenRepository, Box<dyn std::error::Error>> {
//!     let client = DbClient::from_url("sqlite://data/goforcab.db").await?;
//!     let repository = SqlDeviceTokenRepository::new(client);
//!     repository.init_schema().await?;
//!     Ok(repository)
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;

pub use client::DbClient;
pub use error::DbError;

pub use repositories::{
    DeviceTokenFields, DeviceTokenRepository, MemoryDeviceTokenRepository,
    SqlDeviceTokenRepository, WriteOptions,
};
