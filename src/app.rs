use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::{self, AppState};
use crate::config::AppConfig;
use crate::core::{DriverRegistry, Model};

/// Composition root: configuration, driver registry, model and router.
pub struct App {
    config: Arc<AppConfig>,
    registry: Arc<DriverRegistry>,
    model: Arc<Model>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(DriverRegistry::new(config.clone()));
        let model = Arc::new(Model::new(registry.clone(), &config));
        Self {
            config,
            registry,
            model,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        api::router(AppState {
            model: self.model.clone(),
        })
    }

    /// Build the active driver eagerly so configuration problems show up at start-up.
    ///
    /// An unreachable datastore is only logged; the status endpoint reports it.
    pub async fn prepare(&self) {
        match self.registry.active() {
            Ok(driver) => match driver.open().await {
                Ok(()) => info!("Opened {} datastore", driver.kind()),
                Err(err) if err.is_capability_gap() => {
                    info!("{} datastore needs no explicit open", driver.kind())
                }
                Err(err) => warn!("Could not open {} datastore: {}", driver.kind(), err),
            },
            Err(err) => warn!("No usable datastore driver: {}", err),
        }
    }

    pub async fn run(self) -> Result<()> {
        self.prepare().await;

        let addr = self.config.server.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!("Datastore service listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server terminated")?;

        info!("Datastore service stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prepare_tolerates_unknown_driver() {
        let app = App::new(AppConfig {
            active_driver: "baddrivername".to_string(),
            ..AppConfig::default()
        });
        app.prepare().await;
        assert_eq!(app.config().active_driver, "baddrivername");
    }
}
