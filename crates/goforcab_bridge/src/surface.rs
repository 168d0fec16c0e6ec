//! The embedded web surface as seen by the identity bridge.
//!
//! The page's notion of "who is logged in" is not a stable contract, so the
//! surface only exposes raw material: the in-page auth client (if loaded) and
//! the page's local storage.

use thiserror::Error;

/// Errors raised while reading from the web surface
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The in-page authentication client threw
    #[error("auth client error: {0}")]
    AuthClient(String),

    /// Local storage could not be read
    #[error("storage unavailable: {0}")]
    Storage(String),
}

/// Read access to the page hosted in the web view
pub trait WebSurface: Send + Sync {
    /// Whether the page has loaded an authentication client
    fn auth_client_available(&self) -> bool;

    /// The auth client's current user id, if someone is signed in
    fn current_user_id(&self) -> Result<Option<String>, SurfaceError>;

    /// All local storage entries as `(key, value)` pairs
    fn storage_entries(&self) -> Result<Vec<(String, String)>, SurfaceError>;
}

/// Something that happened inside the page and may warrant a re-check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// A local storage key was written or removed
    StorageChanged { key: String },
    /// A form was submitted
    FormSubmitted,
    /// An element was clicked; `text` is its visible label
    Clicked { text: String },
    /// The in-page auth client reported a new state; `None` means signed out
    AuthStateChanged { user_id: Option<String> },
}

const AUTH_KEY_HINTS: [&str; 4] = ["firebase", "auth", "user", "token"];

const LOGIN_ACTION_HINTS: [&str; 6] = ["login", "log in", "sign in", "verify", "otp", "continue"];

/// Whether a storage key looks like it belongs to an auth session
pub fn is_auth_storage_key(key: &str) -> bool {
    let key = key.to_lowercase();
    AUTH_KEY_HINTS.iter().any(|hint| key.contains(hint))
}

/// Whether a clicked element's text suggests a login or verify action
pub fn is_login_action(text: &str) -> bool {
    let text = text.to_lowercase();
    LOGIN_ACTION_HINTS.iter().any(|hint| text.contains(hint))
}
