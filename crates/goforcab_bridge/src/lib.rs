//! Identity bridge for the GoForCab shell
//!
//! The hosted website owns login. This crate watches the page from the
//! outside, works out which user (if any) is signed in, and posts the
//! identity to the native host whenever it changes.
//!
//! - [`surface`]: what the bridge can see of the page
//! - [`extractors`] and [`detector`]: ordered detection strategies with a
//!   `"guest"` fallback
//! - [`monitor`]: polling plus event-driven re-checks
//! - [`message`]: the `{type, data}` messages the host receives
//! - [`login`]: the phone number and one-time code login flow

pub mod detector;
pub mod extractors;
pub mod login;
pub mod message;
pub mod monitor;
pub mod surface;

pub use detector::{ChangeGate, Detection, DiagnosticSnapshot, IdentityDetector};
pub use extractors::{Extraction, Extractor, SessionPayloadError};
pub use login::{AuthProvider, AuthProviderError, LoginError, LoginFlow, LoginStep, SignedInUser};
pub use message::{parse_message, BridgeMessage, MessageError};
pub use monitor::IdentityBridge;
pub use surface::{SurfaceError, SurfaceEvent, WebSurface};
