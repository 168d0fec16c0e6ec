// File: services/goforcab_shell/src/main.rs
use goforcab_common::{config_error, log_error, logging, models::Platform, GoforcabError};
use goforcab_config::{load_config, AppConfig, StoreBackend};
use goforcab_db::{DeviceTokenRepository, MemoryDeviceTokenRepository};
use goforcab_reconciler::{run_startup, Reconciler};
use goforcab_shell::{store, HeadlessDevice, Host, LogUi, NavigationPolicy};
use tokio::io::BufReader;
use tracing::info;

async fn serve<R: DeviceTokenRepository>(store: R, config: &AppConfig) -> Result<(), GoforcabError> {
    let platform: Platform = config
        .device
        .platform
        .parse()
        .map_err(config_error)?;

    let device = HeadlessDevice::new(config.device.clone());
    let mut reconciler = Reconciler::new(store, platform);
    let report = run_startup(&mut reconciler, &device, &device, &LogUi).await;
    info!(state = ?reconciler.state(), "Startup finished: {:?}", report.push_token);

    let mut host = Host::new(reconciler, NavigationPolicy::new(config.web.url.clone()));
    host.run(BufReader::new(tokio::io::stdin())).await
}

#[tokio::main]
async fn main() -> Result<(), GoforcabError> {
    let config = load_config()?;
    let _log_guard = logging::init_with_config(&config.logging);

    info!("Starting GoForCab shell with {:?} store", config.store.backend);

    let result = match config.store.backend {
        StoreBackend::Memory => serve(MemoryDeviceTokenRepository::new(), &config).await,
        StoreBackend::Sql => match store::sql_store(&config).await {
            Ok(sql) => serve(sql, &config).await,
            Err(e) => Err(e),
        },
        #[cfg(feature = "firebase")]
        StoreBackend::Firestore => match store::firestore_store(&config).await {
            Ok(firestore) => serve(firestore, &config).await,
            Err(e) => Err(e),
        },
        #[cfg(not(feature = "firebase"))]
        StoreBackend::Firestore => Err(config_error("built without the firebase feature")),
    };

    if let Err(e) = &result {
        log_error(e, "GoForCab shell stopped");
    }
    result
}
