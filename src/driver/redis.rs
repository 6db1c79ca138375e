//! Remote key-value cache backed by a deadpool-redis pool.
//!
//! Records are stored as JSON under their question id. The pool connects
//! lazily, so building the driver never touches the network.

use async_trait::async_trait;
use deadpool_redis::redis::{AsyncCommands, cmd};
use deadpool_redis::{Config, Connection, Pool, Runtime};
use tracing::{debug, info};
use url::Url;

use super::memory::SYNTHETIC_AFFECTED;
use super::{Driver, DriverKind, sealed};
use crate::config::RedisConfig;
use crate::core::message::QuestionRecord;
use crate::error::{StoreError, StoreResult};

const BACKEND: DriverKind = DriverKind::Redis;

/// Resolve the server URL from configuration.
///
/// Production prefers `tls_url`, then `url`, then `redis://host:port/db`.
/// A configured password is injected when the URL does not carry one.
pub fn connection_url(config: &RedisConfig, production: bool) -> StoreResult<Url> {
    let candidate = match (production, &config.tls_url, &config.url) {
        (true, Some(tls), _) => tls.clone(),
        (_, _, Some(url)) => url.clone(),
        _ => format!("redis://{}:{}/{}", config.host, config.port, config.db),
    };

    let mut url = Url::parse(&candidate).map_err(|e| StoreError::connection(BACKEND, e))?;
    if !matches!(url.scheme(), "redis" | "rediss") {
        return Err(StoreError::connection(
            BACKEND,
            format!("unsupported url scheme `{}`", url.scheme()),
        ));
    }

    if let Some(password) = config.password.as_deref().filter(|p| !p.is_empty()) {
        if url.password().is_none() {
            url.set_password(Some(password))
                .map_err(|_| StoreError::connection(BACKEND, "cannot set password on url"))?;
        }
    }

    Ok(url)
}

pub struct RedisDriver {
    pool: Pool,
}

impl RedisDriver {
    pub fn new(config: &RedisConfig, production: bool) -> StoreResult<Self> {
        let url = connection_url(config, production)?;
        info!(
            "Creating redis pool for {}:{}",
            url.host_str().unwrap_or_default(),
            url.port().unwrap_or(6379)
        );

        let pool = Config::from_url(url.as_str())
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::connection(BACKEND, e))?;

        Ok(Self { pool })
    }

    async fn conn(&self) -> StoreResult<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::connection(BACKEND, e))
    }

    async fn put(&self, record: &QuestionRecord) -> StoreResult<u64> {
        let bytes = serde_json::to_vec(record).map_err(|e| StoreError::codec(BACKEND, e))?;
        let mut conn = self.conn().await?;
        let _: () = conn
            .set(&record.question_id, bytes)
            .await
            .map_err(|e| StoreError::query(BACKEND, e))?;
        Ok(SYNTHETIC_AFFECTED)
    }
}

impl sealed::Sealed for RedisDriver {}

#[async_trait]
impl Driver for RedisDriver {
    fn kind(&self) -> DriverKind {
        BACKEND
    }

    async fn open(&self) -> StoreResult<()> {
        Err(StoreError::unsupported(BACKEND, "open"))
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let _pong: String = cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::connection(BACKEND, e))?;
        Ok(())
    }

    async fn insert(&self, record: &QuestionRecord) -> StoreResult<u64> {
        debug!("redis: adding record {}", record.question_id);
        self.put(record).await
    }

    async fn fetch(&self, question_id: &str) -> StoreResult<Option<QuestionRecord>> {
        let mut conn = self.conn().await?;
        let bytes: Option<Vec<u8>> = conn
            .get(question_id)
            .await
            .map_err(|e| StoreError::query(BACKEND, e))?;

        match bytes {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::codec(BACKEND, e)),
            None => {
                debug!("redis: no record for {}", question_id);
                Ok(None)
            }
        }
    }

    async fn update(&self, record: &QuestionRecord) -> StoreResult<u64> {
        debug!("redis: updating record {}", record.question_id);
        self.put(record).await
    }

    async fn delete(&self, question_id: &str) -> StoreResult<u64> {
        debug!("redis: deleting record {}", question_id);
        let mut conn = self.conn().await?;
        let removed: u64 = conn
            .del(question_id)
            .await
            .map_err(|e| StoreError::query(BACKEND, e))?;
        debug!("redis: DEL removed {} key(s)", removed);
        Ok(SYNTHETIC_AFFECTED)
    }
}
