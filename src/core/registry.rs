//! Driver selection.
//!
//! The registry is owned by the application and holds at most one instance of
//! each driver kind, built lazily from configuration the first time it is
//! requested.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::driver::{
    Driver, DriverKind, MemoryDriver, MySqlDriver, PostgresDriver, RedisDriver,
};
use crate::error::StoreError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unsupported datastore driver: {0:?}")]
    Unsupported(String),

    #[error("failed to create {kind} driver: {source}")]
    Build {
        kind: DriverKind,
        #[source]
        source: StoreError,
    },
}

pub struct DriverRegistry {
    config: Arc<AppConfig>,
    slots: [OnceCell<Arc<dyn Driver>>; 4],
}

impl DriverRegistry {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            slots: std::array::from_fn(|_| OnceCell::new()),
        }
    }

    /// Registry whose slot for `driver.kind()` is already filled.
    #[cfg(test)]
    pub(crate) fn with_driver(config: Arc<AppConfig>, driver: Arc<dyn Driver>) -> Self {
        let registry = Self::new(config);
        let _ = registry.slot(driver.kind()).set(driver);
        registry
    }

    /// Resolve a configuration token to its driver instance
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Driver>, RegistryError> {
        let kind: DriverKind = name.parse().map_err(|err| {
            warn!("Unsupported database driver: {}", err);
            RegistryError::Unsupported(name.to_string())
        })?;
        self.get(kind)
    }

    /// The driver selected by `active_driver`
    pub fn active(&self) -> Result<Arc<dyn Driver>, RegistryError> {
        self.resolve(&self.config.active_driver)
    }

    pub fn get(&self, kind: DriverKind) -> Result<Arc<dyn Driver>, RegistryError> {
        self.slot(kind)
            .get_or_try_init(|| self.build(kind))
            .cloned()
    }

    fn slot(&self, kind: DriverKind) -> &OnceCell<Arc<dyn Driver>> {
        let index = match kind {
            DriverKind::Memory => 0,
            DriverKind::Redis => 1,
            DriverKind::MySql => 2,
            DriverKind::Postgres => 3,
        };
        &self.slots[index]
    }

    fn build(&self, kind: DriverKind) -> Result<Arc<dyn Driver>, RegistryError> {
        info!("Creating {} datastore driver", kind);
        let config = &self.config;
        let driver: Arc<dyn Driver> = match kind {
            DriverKind::Memory => Arc::new(MemoryDriver::new(&config.memory)),
            DriverKind::Redis => Arc::new(
                RedisDriver::new(&config.redis, config.is_production())
                    .map_err(|source| RegistryError::Build { kind, source })?,
            ),
            DriverKind::MySql => Arc::new(
                MySqlDriver::new(&config.mysql)
                    .map_err(|source| RegistryError::Build { kind, source })?,
            ),
            DriverKind::Postgres => Arc::new(PostgresDriver::new(&config.postgres)),
        };
        Ok(driver)
    }
}
