//! Environment variable naming for the GoForCab configuration.
//!
//! Every configuration key can be overridden from the environment using the
//! prefix and separator below, e.g. `store.backend` becomes
//! `GOFORCAB__STORE__BACKEND`. `PREFIX` replaces the default prefix.

use std::env;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "GOFORCAB";

/// The separator for configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// Get the prefix for configuration environment variables
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefix() {
        if env::var("PREFIX").is_ok() {
            return;
        }
        assert_eq!(get_config_prefix(), "GOFORCAB");
    }
}
