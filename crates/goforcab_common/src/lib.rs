// --- File: crates/goforcab_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Error handling
pub mod logging; // Logging utilities
pub mod models; // Data structures and models

// Re-export error types and utilities for easier access
pub use error::{config_error, database_error, external_service_error, GoforcabError};

// Re-export logging utilities for easier access
pub use logging::{init_with_config, log_error, log_result};

pub use models::{DeviceTokenRecord, Platform, UserId, GUEST_USER_ID};
