//! Configuration for the GoForCab shell.
//!
//! Sources are layered in this order, later ones winning:
//!
//! 1. `config/default.{toml,yaml,json}`
//! 2. `config/{RUN_ENV}.{toml,yaml,json}` (`RUN_ENV` defaults to `debug`)
//! 3. `GOFORCAB__SECTION__KEY` environment variables
//!
//! A `.env` file is loaded into the environment once before the first lookup.
//! The configuration directory can be moved with `CONFIG_DIR`.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::Path;
use tracing::debug;

pub mod env_vars;
pub mod models;

pub use models::*;

/// Loads the configuration from the default locations.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    load_config_from(Path::new(&config_dir), &run_env)
}

/// Loads the configuration from `config_dir` for the given run environment.
///
/// Missing files are not an error; every section has defaults.
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, ConfigError> {
    let prefix = env_vars::get_config_prefix();

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(run_env);

    debug!("Loading configuration from {}", config_dir.display());

    let builder = Config::builder()
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(Environment::with_prefix(&prefix).separator(env_vars::CONFIG_SEPARATOR));

    builder.build()?.try_deserialize()
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// The file defaults to `.env` and can be overridden with `DOTENV_OVERRIDE`.
/// Returns the path that was used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = env::temp_dir().join(format!("goforcab-config-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_defaults_when_no_files() {
        let dir = scratch_dir("empty");
        let config = load_config_from(&dir, "debug").unwrap();

        assert_eq!(config.web.url, "https://goforcab.com/");
        assert_eq!(config.store.collection, "deviceTokens");
        assert_eq!(config.bridge.storage_key_patterns, vec!["firebase:authUser:"]);
        assert!(config.firebase.is_none());
    }

    #[test]
    fn test_run_env_file_overrides_default() {
        let dir = scratch_dir("layered");
        fs::write(
            dir.join("default.toml"),
            "[store]\nbackend = \"sql\"\n\n[database]\nurl = \"sqlite://default.db\"\n",
        )
        .unwrap();
        fs::write(
            dir.join("production.toml"),
            "[database]\nurl = \"sqlite://production.db\"\n\n[bridge]\npoll_interval_ms = 500\n",
        )
        .unwrap();

        let config = load_config_from(&dir, "production").unwrap();

        assert_eq!(config.store.backend, StoreBackend::Sql);
        assert_eq!(config.database.unwrap().url, "sqlite://production.db");
        assert_eq!(config.bridge.poll_interval_ms, 500);
        assert_eq!(config.bridge.settle_delay_ms, 1000);
    }
}
