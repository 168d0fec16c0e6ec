// --- File: crates/services/goforcab_shell/src/device.rs ---

// Platform services for a shell running without a phone attached. Every
// answer comes from the `device` configuration section.

use async_trait::async_trait;
use goforcab_config::DeviceConfig;
use goforcab_reconciler::{
    DeviceError, HostUi, LocationService, NotificationService, PermissionStatus, Position,
};
use tracing::warn;

fn permission(granted: bool) -> PermissionStatus {
    if granted {
        PermissionStatus::Granted
    } else {
        PermissionStatus::Denied
    }
}

pub struct HeadlessDevice {
    config: DeviceConfig,
}

impl HeadlessDevice {
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NotificationService for HeadlessDevice {
    async fn request_permission(&self) -> Result<PermissionStatus, DeviceError> {
        Ok(permission(self.config.notifications_granted))
    }

    async fn push_token(&self) -> Result<String, DeviceError> {
        self.config
            .push_token
            .clone()
            .ok_or(DeviceError::Unsupported("push messaging"))
    }
}

#[async_trait]
impl LocationService for HeadlessDevice {
    async fn request_foreground_permission(&self) -> Result<PermissionStatus, DeviceError> {
        Ok(permission(self.config.location_granted))
    }

    async fn current_position(&self) -> Result<Position, DeviceError> {
        Ok(Position {
            latitude: self.config.latitude,
            longitude: self.config.longitude,
        })
    }
}

/// Alerts go to the log
pub struct LogUi;

#[async_trait]
impl HostUi for LogUi {
    async fn alert(&self, message: &str) {
        warn!(alert = message, "User alert");
    }
}
