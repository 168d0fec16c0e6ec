//! Headless host for the GoForCab website shell
//!
//! Wires the configured device token store, the reconciler and the web
//! surface message channel together.

pub mod device;
pub mod host;
pub mod store;

pub use device::{HeadlessDevice, LogUi};
pub use host::{Host, LineOutcome, NavigationPolicy};
