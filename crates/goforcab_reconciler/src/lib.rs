//! Device token reconciliation for the GoForCab shell
//!
//! Ties the device's push token to the user currently signed in on the
//! hosted website. One remote record exists per push token; its `user_id`
//! follows the identities the bridge reports.
//!
//! # Example
//!
//! ```rust,no_run
//! use goforcab_common::models::Platform;
//! use goforcab_db::MemoryDeviceTokenRepository;
//! use goforcab_reconciler::Reconciler;
//!
//! async fn reconcile() {
//!     let mut reconciler = Reconciler::new(MemoryDeviceTokenRepository::new(), Platform::Android);
//!     reconciler.on_push_token("fcm-token").await;
//!     reconciler.on_identity_reported("u555").await;
//! }
//! ```

pub mod device;
pub mod reconciler;
pub mod session;
pub mod startup;

pub use device::{
    acquire_push_token, DeviceError, HostUi, LocationService, NotificationService,
    PermissionStatus, Position,
};
pub use reconciler::{
    IdentityOutcome, PushTokenOutcome, Reconciler, UpsertOutcome, UpsertTrigger,
};
pub use session::{ReconcilerState, SessionState};
pub use startup::{run_startup, StartupReport, LOCATION_DENIED_MESSAGE};
