//! In-process expiring cache backed by moka.

use async_trait::async_trait;
use moka::future::Cache;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{Driver, DriverKind, sealed};
use crate::config::MemoryConfig;
use crate::core::message::QuestionRecord;
use crate::error::{StoreError, StoreResult};

/// Affected count reported by cache backends, which have no row concept
pub const SYNTHETIC_AFFECTED: u64 = 0;

pub struct MemoryDriver {
    cache: Cache<String, QuestionRecord>,
    /// Periodic eviction of expired entries, when a cleanup interval is configured
    housekeeper: Option<JoinHandle<()>>,
}

impl MemoryDriver {
    pub fn new(config: &MemoryConfig) -> Self {
        let mut builder = Cache::builder().name("datastore-memory");
        if let Some(ttl) = config.expiration() {
            builder = builder.time_to_live(ttl);
        }
        let cache: Cache<String, QuestionRecord> = builder.build();

        info!(
            "Creating in-memory cache (expiration: {} min, cleanup: {} min)",
            config.expiration_mins, config.cleanup_mins
        );

        let housekeeper = match (config.cleanup_interval(), tokio::runtime::Handle::try_current()) {
            (Some(interval), Ok(handle)) => {
                let cache = cache.clone();
                Some(handle.spawn(async move {
                    let mut ticker = tokio::time::interval(interval);
                    // first tick fires immediately
                    ticker.tick().await;
                    loop {
                        ticker.tick().await;
                        cache.run_pending_tasks().await;
                        debug!("memory: cleanup pass done, {} entries", cache.entry_count());
                    }
                }))
            }
            _ => None,
        };

        Self { cache, housekeeper }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Drop for MemoryDriver {
    fn drop(&mut self) {
        if let Some(handle) = self.housekeeper.take() {
            handle.abort();
        }
    }
}

impl sealed::Sealed for MemoryDriver {}

#[async_trait]
impl Driver for MemoryDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Memory
    }

    async fn open(&self) -> StoreResult<()> {
        Err(StoreError::unsupported(DriverKind::Memory, "open"))
    }

    async fn ping(&self) -> StoreResult<()> {
        match &self.housekeeper {
            Some(handle) if handle.is_finished() => Err(StoreError::connection(
                DriverKind::Memory,
                "in-memory cache cleanup task has stopped",
            )),
            _ => Ok(()),
        }
    }

    async fn insert(&self, record: &QuestionRecord) -> StoreResult<u64> {
        debug!("memory: adding record {}", record.question_id);
        self.cache
            .insert(record.question_id.clone(), record.clone())
            .await;
        Ok(SYNTHETIC_AFFECTED)
    }

    async fn fetch(&self, question_id: &str) -> StoreResult<Option<QuestionRecord>> {
        let record = self.cache.get(question_id).await;
        if record.is_none() {
            debug!("memory: no record for {}", question_id);
        }
        Ok(record)
    }

    async fn update(&self, record: &QuestionRecord) -> StoreResult<u64> {
        // same keyed overwrite as insert
        debug!("memory: updating record {}", record.question_id);
        self.cache
            .insert(record.question_id.clone(), record.clone())
            .await;
        Ok(SYNTHETIC_AFFECTED)
    }

    async fn delete(&self, question_id: &str) -> StoreResult<u64> {
        debug!("memory: deleting record {}", question_id);
        self.cache.invalidate(question_id).await;
        Ok(SYNTHETIC_AFFECTED)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn no_expiry() -> MemoryConfig {
        MemoryConfig {
            expiration_mins: 0,
            cleanup_mins: 0,
        }
    }

    fn sample() -> QuestionRecord {
        QuestionRecord::new("aaaaqqqq", "What is 4 / 2?", "math", "2")
    }

    #[tokio::test]
    async fn test_open_is_a_capability_gap() {
        let driver = MemoryDriver::new(&no_expiry());
        let err = driver.open().await.unwrap_err();
        assert!(err.is_capability_gap());
    }

    #[tokio::test]
    async fn test_oversized_minutes_do_not_panic() {
        let driver = MemoryDriver::new(&MemoryConfig {
            expiration_mins: u64::MAX,
            cleanup_mins: 0,
        });
        driver.insert(&sample()).await.unwrap();
        assert_eq!(driver.fetch("aaaaqqqq").await.unwrap(), Some(sample()));
    }

    #[tokio::test]
    async fn test_ping() {
        let driver = MemoryDriver::new(&MemoryConfig::default());
        assert!(driver.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_insert_then_fetch() {
        let driver = MemoryDriver::new(&no_expiry());
        let record = sample();

        assert_eq!(driver.insert(&record).await.unwrap(), SYNTHETIC_AFFECTED);
        assert_eq!(driver.fetch("aaaaqqqq").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_an_error() {
        let driver = MemoryDriver::new(&no_expiry());
        assert_eq!(driver.fetch("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_overwrites_existing_identifier() {
        let driver = MemoryDriver::new(&no_expiry());
        driver.insert(&sample()).await.unwrap();

        let replacement = QuestionRecord::new("aaaaqqqq", "What is 9 / 3?", "math", "3");
        driver.insert(&replacement).await.unwrap();

        assert_eq!(driver.fetch("aaaaqqqq").await.unwrap(), Some(replacement));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let driver = MemoryDriver::new(&no_expiry());
        let mut record = sample();
        driver.insert(&record).await.unwrap();

        record.category = "general".to_string();
        assert_eq!(driver.update(&record).await.unwrap(), SYNTHETIC_AFFECTED);
        assert_eq!(
            driver.fetch("aaaaqqqq").await.unwrap().unwrap().category,
            "general"
        );

        assert_eq!(driver.delete("aaaaqqqq").await.unwrap(), SYNTHETIC_AFFECTED);
        assert_eq!(driver.fetch("aaaaqqqq").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let driver = MemoryDriver::new(&no_expiry());
        assert!(driver.delete("nonexistent").await.is_ok());
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let driver = MemoryDriver {
            cache: Cache::builder()
                .time_to_live(Duration::from_millis(50))
                .build(),
            housekeeper: None,
        };
        driver.insert(&sample()).await.unwrap();
        assert!(driver.fetch("aaaaqqqq").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(driver.fetch("aaaaqqqq").await.unwrap(), None);
    }
}
