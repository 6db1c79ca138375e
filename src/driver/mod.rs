//! Storage drivers.
//!
//! Every backend implements the same [`Driver`] contract even though the
//! underlying technologies disagree on almost everything:
//!
//! | backend    | `open`        | affected count | missing key       |
//! |------------|---------------|----------------|-------------------|
//! | `memory`   | unsupported   | always `0`     | `Ok(None)`        |
//! | `redis`    | unsupported   | always `0`     | nil → `Ok(None)`  |
//! | `mysql`    | new connection| rows affected  | no rows → `None`  |
//! | `postgres` | new connection| rows affected  | no rows → `None`  |
//!
//! The trait is sealed: the four drivers in this module are the only implementers.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::core::message::QuestionRecord;
use crate::error::StoreResult;

pub mod memory;
pub mod mysql;
pub mod postgres;
pub mod redis;
pub(crate) mod sql;

pub use memory::MemoryDriver;
pub use mysql::MySqlDriver;
pub use postgres::PostgresDriver;
pub use redis::RedisDriver;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Uniform storage contract
#[async_trait]
pub trait Driver: sealed::Sealed + Send + Sync + 'static {
    fn kind(&self) -> DriverKind;

    /// Establish a connection to the backing store.
    ///
    /// Cache backends have nothing to open and report a capability gap.
    async fn open(&self) -> StoreResult<()>;

    /// Health check
    async fn ping(&self) -> StoreResult<()>;

    async fn insert(&self, record: &QuestionRecord) -> StoreResult<u64>;

    /// `Ok(None)` when no record exists for `question_id`.
    async fn fetch(&self, question_id: &str) -> StoreResult<Option<QuestionRecord>>;

    async fn update(&self, record: &QuestionRecord) -> StoreResult<u64>;

    async fn delete(&self, question_id: &str) -> StoreResult<u64>;
}

// ============================================================================
// Driver kind
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    /// In-process expiring cache
    Memory,
    /// Remote key-value cache
    Redis,
    MySql,
    Postgres,
}

impl DriverKind {
    pub const ALL: [DriverKind; 4] = [Self::Memory, Self::Redis, Self::MySql, Self::Postgres];

    /// Configuration token selecting this driver
    pub fn token(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redis => "redis",
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
        }
    }

    /// Older tokens still accepted when parsing
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Memory => &["gocache"],
            _ => &[],
        }
    }

    /// Whether affected counts come from the store itself (SQL) or are synthetic (caches)
    pub fn reports_affected(self) -> bool {
        matches!(self, Self::MySql | Self::Postgres)
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDriver(pub String);

impl fmt::Display for UnknownDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown datastore driver {:?}", self.0)
    }
}

impl std::error::Error for UnknownDriver {}

impl FromStr for DriverKind {
    type Err = UnknownDriver;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| {
                std::iter::once(kind.token())
                    .chain(kind.aliases().iter().copied())
                    .any(|name| name.eq_ignore_ascii_case(token))
            })
            .ok_or_else(|| UnknownDriver(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_round_trip() {
        for kind in DriverKind::ALL {
            assert_eq!(kind.token().parse::<DriverKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_parse_is_lenient_about_case_and_whitespace() {
        assert_eq!(" Redis ".parse::<DriverKind>().unwrap(), DriverKind::Redis);
        assert_eq!("POSTGRES".parse::<DriverKind>().unwrap(), DriverKind::Postgres);
    }

    #[test]
    fn test_gocache_selects_memory() {
        assert_eq!("gocache".parse::<DriverKind>().unwrap(), DriverKind::Memory);
        assert_eq!(" GoCache ".parse::<DriverKind>().unwrap(), DriverKind::Memory);
        assert_eq!(DriverKind::Memory.token(), "memory");
    }

    #[test]
    fn test_unknown_token() {
        let err = "baddrivername".parse::<DriverKind>().unwrap_err();
        assert_eq!(err, UnknownDriver("baddrivername".to_string()));
        assert!("".parse::<DriverKind>().is_err());
    }

    #[test]
    fn test_only_sql_reports_affected() {
        assert!(!DriverKind::Memory.reports_affected());
        assert!(!DriverKind::Redis.reports_affected());
        assert!(DriverKind::MySql.reports_affected());
        assert!(DriverKind::Postgres.reports_affected());
    }
}
