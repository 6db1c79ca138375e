use anyhow::Result;
use datastore_service::{App, AppConfig, logging};
use mimalloc::MiMalloc;
use tracing::info;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    let _log_guard = logging::init(&config.log)?;

    match &config.source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No configuration file found, using defaults and environment"),
    }
    info!(
        "Starting datastore service v{} ({} driver, {})",
        env!("CARGO_PKG_VERSION"),
        config.active_driver,
        config.env
    );

    App::new(config).run().await
}
