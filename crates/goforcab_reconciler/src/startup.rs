// --- File: crates/goforcab_reconciler/src/startup.rs ---

// Host startup: location permission, then notification permission and the
// initial device token upsert.

use crate::device::{
    acquire_push_token, HostUi, LocationService, NotificationService, PermissionStatus, Position,
};
use crate::reconciler::{PushTokenOutcome, Reconciler};
use goforcab_db::DeviceTokenRepository;
use tracing::{error, info, instrument};

pub const LOCATION_DENIED_MESSAGE: &str = "Permission to access location was denied";

#[derive(Debug, Clone, PartialEq)]
pub struct StartupReport {
    pub position: Option<Position>,
    /// `None` when no push token could be obtained
    pub push_token: Option<PushTokenOutcome>,
}

/// Ask for location access and log the position; alert on denial.
pub async fn request_location<L, U>(location: &L, ui: &U) -> Option<Position>
where
    L: LocationService + ?Sized,
    U: HostUi + ?Sized,
{
    match location.request_foreground_permission().await {
        Ok(PermissionStatus::Granted) => {}
        Ok(PermissionStatus::Denied) => {
            ui.alert(LOCATION_DENIED_MESSAGE).await;
            return None;
        }
        Err(e) => {
            error!("Failed to request location permission: {}", e);
            ui.alert(LOCATION_DENIED_MESSAGE).await;
            return None;
        }
    }

    match location.current_position().await {
        Ok(position) => {
            info!(
                latitude = position.latitude,
                longitude = position.longitude,
                "Current position"
            );
            Some(position)
        }
        Err(e) => {
            error!("Failed to read current position: {}", e);
            None
        }
    }
}

/// Run the host startup sequence.
///
/// Location and notifications are independent: a location denial never
/// keeps the push token from being reconciled.
#[instrument(skip_all)]
pub async fn run_startup<R, N, L, U>(
    reconciler: &mut Reconciler<R>,
    notifications: &N,
    location: &L,
    ui: &U,
) -> StartupReport
where
    R: DeviceTokenRepository,
    N: NotificationService + ?Sized,
    L: LocationService + ?Sized,
    U: HostUi + ?Sized,
{
    let position = request_location(location, ui).await;

    let push_token = match acquire_push_token(notifications).await {
        Some(token) => Some(reconciler.on_push_token(&token).await),
        None => {
            info!("Continuing without push notifications");
            None
        }
    };

    StartupReport {
        position,
        push_token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceError, MockHostUi, MockLocationService, MockNotificationService};
    use crate::reconciler::UpsertOutcome;
    use crate::session::ReconcilerState;
    use goforcab_common::models::Platform;
    use goforcab_db::MemoryDeviceTokenRepository;

    fn granted_notifications(token: &'static str) -> MockNotificationService {
        let mut notifications = MockNotificationService::new();
        notifications
            .expect_request_permission()
            .returning(|| Ok(PermissionStatus::Granted));
        notifications
            .expect_push_token()
            .returning(move || Ok(token.to_string()));
        notifications
    }

    fn granted_location() -> MockLocationService {
        let mut location = MockLocationService::new();
        location
            .expect_request_foreground_permission()
            .returning(|| Ok(PermissionStatus::Granted));
        location.expect_current_position().returning(|| {
            Ok(Position {
                latitude: 28.6139,
                longitude: 77.209,
            })
        });
        location
    }

    #[tokio::test]
    async fn test_location_denied_alerts_and_continues() {
        let mut location = MockLocationService::new();
        location
            .expect_request_foreground_permission()
            .returning(|| Ok(PermissionStatus::Denied));
        location.expect_current_position().never();

        let mut ui = MockHostUi::new();
        ui.expect_alert()
            .withf(|message| message == LOCATION_DENIED_MESSAGE)
            .times(1)
            .return_const(());

        let mut reconciler = Reconciler::new(MemoryDeviceTokenRepository::new(), Platform::Ios);
        let report = run_startup(&mut reconciler, &granted_notifications("T"), &location, &ui).await;

        assert_eq!(report.position, None);
        assert!(matches!(
            report.push_token,
            Some(PushTokenOutcome::Upserted(UpsertOutcome::Created { .. }))
        ));
        assert_eq!(reconciler.state(), ReconcilerState::Reconciled);
    }

    #[tokio::test]
    async fn test_notifications_denied_leaves_no_token() {
        let mut notifications = MockNotificationService::new();
        notifications
            .expect_request_permission()
            .returning(|| Ok(PermissionStatus::Denied));

        let mut ui = MockHostUi::new();
        ui.expect_alert().never();

        let mut reconciler = Reconciler::new(MemoryDeviceTokenRepository::new(), Platform::Android);
        let report = run_startup(&mut reconciler, &notifications, &granted_location(), &ui).await;

        assert!(report.position.is_some());
        assert_eq!(report.push_token, None);
        assert_eq!(reconciler.state(), ReconcilerState::NoToken);
        assert_eq!(reconciler.store().write_count(), 0);
    }

    #[tokio::test]
    async fn test_position_error_is_not_fatal() {
        let mut location = MockLocationService::new();
        location
            .expect_request_foreground_permission()
            .returning(|| Ok(PermissionStatus::Granted));
        location
            .expect_current_position()
            .returning(|| Err(DeviceError::Service("no fix".to_string())));
        let ui = MockHostUi::new();

        assert_eq!(request_location(&location, &ui).await, None);
    }
}
