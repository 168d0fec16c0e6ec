// --- File: crates/goforcab_common/src/models.rs ---

// Data structures shared by the bridge, the reconciler and the record stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity reported while no authenticated user is known.
pub const GUEST_USER_ID: &str = "guest";

/// Opaque user identifier issued by the authentication provider.
///
/// `"guest"` is the sentinel for "no authenticated user yet".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The sentinel identity.
    pub fn guest() -> Self {
        Self(GUEST_USER_ID.to_string())
    }

    pub fn is_guest(&self) -> bool {
        self.0 == GUEST_USER_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::guest()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Mobile OS family a push token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Web,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
            Self::Web => "web",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "android" => Ok(Self::Android),
            "ios" => Ok(Self::Ios),
            "web" => Ok(Self::Web),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

/// Remote record binding a device push token to the user last seen on it.
///
/// The push token is the natural key: at most one record per token is kept,
/// and records are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTokenRecord {
    /// Locally generated document id
    pub record_id: String,

    /// Owning user, `"guest"` until someone signs in
    pub user_id: String,

    /// Token issued by the platform notification service
    pub push_token: String,

    pub platform: Platform,

    /// Assigned by the store on creation
    pub created_at: Option<DateTime<Utc>>,

    /// Assigned by the store on every write
    pub updated_at: Option<DateTime<Utc>>,
}

impl DeviceTokenRecord {
    /// Create a record that has not been written yet.
    pub fn new(
        record_id: impl Into<String>,
        user_id: impl Into<String>,
        push_token: impl Into<String>,
        platform: Platform,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            user_id: user_id.into(),
            push_token: push_token.into(),
            platform,
            created_at: None,
            updated_at: None,
        }
    }

    /// Generate a fresh record id.
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}
