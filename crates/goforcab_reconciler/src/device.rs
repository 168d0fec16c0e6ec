//! Platform collaborators: notifications, location and host UI.
//!
//! The reconciler never talks to these directly; the startup sequence reads
//! from them and hands the push token over.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Errors raised by platform services
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("{0} is not supported on this device")]
    Unsupported(&'static str),

    #[error("platform service failed: {0}")]
    Service(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn request_permission(&self) -> Result<PermissionStatus, DeviceError>;

    /// The platform push token for this installation
    async fn push_token(&self) -> Result<String, DeviceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationService: Send + Sync {
    async fn request_foreground_permission(&self) -> Result<PermissionStatus, DeviceError>;

    async fn current_position(&self) -> Result<Position, DeviceError>;
}

/// User-visible surface of the host application
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostUi: Send + Sync {
    async fn alert(&self, message: &str);
}

/// Ask for notification permission and fetch the push token.
///
/// Returns `None` when permission is denied, the platform errors or the
/// token comes back empty. Notifications stay off for the session then.
pub async fn acquire_push_token<N>(notifications: &N) -> Option<String>
where
    N: NotificationService + ?Sized,
{
    match notifications.request_permission().await {
        Ok(PermissionStatus::Granted) => {}
        Ok(PermissionStatus::Denied) => {
            warn!("Notification permission denied, push notifications disabled");
            return None;
        }
        Err(e) => {
            error!("Failed to request notification permission: {}", e);
            return None;
        }
    }

    match notifications.push_token().await {
        Ok(token) if !token.trim().is_empty() => {
            info!("Push token obtained");
            Some(token)
        }
        Ok(_) => {
            warn!("Empty push token received");
            None
        }
        Err(e) => {
            error!("Error getting push token: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_when_granted() {
        let mut notifications = MockNotificationService::new();
        notifications
            .expect_request_permission()
            .returning(|| Ok(PermissionStatus::Granted));
        notifications
            .expect_push_token()
            .returning(|| Ok("fcm-token".to_string()));

        assert_eq!(
            acquire_push_token(&notifications).await,
            Some("fcm-token".to_string())
        );
    }

    #[tokio::test]
    async fn test_no_token_request_when_denied() {
        let mut notifications = MockNotificationService::new();
        notifications
            .expect_request_permission()
            .returning(|| Ok(PermissionStatus::Denied));
        notifications.expect_push_token().never();

        assert_eq!(acquire_push_token(&notifications).await, None);
    }

    #[tokio::test]
    async fn test_empty_or_failing_token_is_none() {
        let mut empty = MockNotificationService::new();
        empty
            .expect_request_permission()
            .returning(|| Ok(PermissionStatus::Granted));
        empty.expect_push_token().returning(|| Ok(String::new()));
        assert_eq!(acquire_push_token(&empty).await, None);

        let mut failing = MockNotificationService::new();
        failing
            .expect_request_permission()
            .returning(|| Ok(PermissionStatus::Granted));
        failing
            .expect_push_token()
            .returning(|| Err(DeviceError::Unsupported("messaging")));
        assert_eq!(acquire_push_token(&failing).await, None);
    }
}
