// --- File: crates/goforcab_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- Embedded Web Surface ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    /// Site loaded into the embedded web surface.
    #[serde(default = "default_web_url")]
    pub url: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            url: default_web_url(),
        }
    }
}

fn default_web_url() -> String {
    "https://goforcab.com/".to_string()
}

// --- Record Store Selection ---
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store, nothing survives a restart.
    #[default]
    Memory,
    /// SQL database reachable through `database.url`.
    Sql,
    /// Cloud Firestore reachable through the `firebase` section.
    Firestore,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Collection (Firestore) holding the device token records.
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            collection: default_collection(),
        }
    }
}

fn default_collection() -> String {
    "deviceTokens".to_string()
}

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite://data/goforcab.db, loaded via GOFORCAB__DATABASE__URL
}

// --- Firebase Config ---
// Non-secret Firebase settings. The service account key itself stays on disk.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct FirebaseConfig {
    pub project_id: Option<String>,
    pub key_path: Option<String>,
    /// Firestore database id, `(default)` when unset.
    pub database_id: Option<String>,
    /// Overrides the Firestore endpoint, e.g. the local emulator.
    pub base_url: Option<String>,
    /// Static bearer token, used instead of the service account (emulator: `owner`).
    pub access_token: Option<String>,
}

// --- Identity Bridge ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BridgeConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Delay between a form submit / login click and the re-check.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Local storage key prefixes that hold a provider session payload.
    #[serde(default = "default_storage_key_patterns")]
    pub storage_key_patterns: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            storage_key_patterns: default_storage_key_patterns(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_storage_key_patterns() -> Vec<String> {
    vec!["firebase:authUser:".to_string()]
}

// --- Headless Device Profile ---
// What the platform services answer when the shell runs without a phone attached.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DeviceConfig {
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default)]
    pub push_token: Option<String>,
    #[serde(default = "default_true")]
    pub notifications_granted: bool,
    #[serde(default = "default_true")]
    pub location_granted: bool,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            push_token: None,
            notifications_granted: true,
            location_granted: true,
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

fn default_platform() -> String {
    "android".to_string()
}

fn default_true() -> bool {
    true
}

// --- Logging ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    // --- Optional Backend Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub firebase: Option<FirebaseConfig>,
}
