// --- File: crates/goforcab_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type for the GoForCab shell.
///
/// Crates keep their own error enums and convert into this one at the
/// process boundary.
#[derive(Error, Debug)]
pub enum GoforcabError {
    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred while talking to the record store
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<serde_json::Error> for GoforcabError {
    fn from(err: serde_json::Error) -> Self {
        GoforcabError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for GoforcabError {
    fn from(err: std::io::Error) -> Self {
        GoforcabError::InternalError(err.to_string())
    }
}

impl From<config::ConfigError> for GoforcabError {
    fn from(err: config::ConfigError) -> Self {
        GoforcabError::ConfigError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> GoforcabError {
    GoforcabError::ConfigError(message.to_string())
}

pub fn database_error<T: fmt::Display>(message: T) -> GoforcabError {
    GoforcabError::DatabaseError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> GoforcabError {
    GoforcabError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_is_internal() {
        let err: GoforcabError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.to_string(), "Internal error: missing");
    }

    #[test]
    fn test_external_service_error_message() {
        let err = external_service_error("firestore", "503");
        assert_eq!(err.to_string(), "External service error: firestore - 503");
    }
}
