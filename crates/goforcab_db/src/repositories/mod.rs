//! Repository modules for device token records
//!
//! The contract lives in `device_token`; the SQL and in-memory stores
//! implement it here, the Firestore store in `goforcab-firebase`.

pub mod device_token;
pub mod device_token_memory;
pub mod device_token_sql;

// Re-export the device token repository contract and stores for ease of use
pub use device_token::{DeviceTokenFields, DeviceTokenRepository, WriteOptions};
pub use device_token_memory::MemoryDeviceTokenRepository;
pub use device_token_sql::SqlDeviceTokenRepository;
