use thiserror::Error;

use crate::driver::DriverKind;

/// Errors reported by a storage driver.
///
/// Absence of a record is never an error: drivers return `Ok(None)` from
/// `fetch` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend has no notion of the requested operation (e.g. `open` on a cache).
    #[error("{backend}: {operation} is not supported by this driver")]
    Unsupported {
        backend: DriverKind,
        operation: &'static str,
    },

    #[error("{backend}: connection failed: {message}")]
    Connection { backend: DriverKind, message: String },

    #[error("{backend}: query failed: {message}")]
    Query { backend: DriverKind, message: String },

    #[error("{backend}: record encoding failed: {message}")]
    Codec { backend: DriverKind, message: String },

    /// The write was applied but finishing the operation failed afterwards.
    /// The mutation stands.
    #[error("{backend}: {operation} applied but could not be completed: {message}")]
    PostWrite {
        backend: DriverKind,
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn unsupported(backend: DriverKind, operation: &'static str) -> Self {
        Self::Unsupported { backend, operation }
    }

    pub fn connection(backend: DriverKind, err: impl ToString) -> Self {
        Self::Connection {
            backend,
            message: err.to_string(),
        }
    }

    pub fn query(backend: DriverKind, err: impl ToString) -> Self {
        Self::Query {
            backend,
            message: err.to_string(),
        }
    }

    pub fn codec(backend: DriverKind, err: impl ToString) -> Self {
        Self::Codec {
            backend,
            message: err.to_string(),
        }
    }

    pub fn post_write(backend: DriverKind, operation: &'static str, err: impl ToString) -> Self {
        Self::PostWrite {
            backend,
            operation,
            message: err.to_string(),
        }
    }

    /// Capability gaps are expected conditions, callers should not treat them as outages.
    pub fn is_capability_gap(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    pub fn backend(&self) -> DriverKind {
        match self {
            Self::Unsupported { backend, .. }
            | Self::Connection { backend, .. }
            | Self::Query { backend, .. }
            | Self::Codec { backend, .. }
            | Self::PostWrite { backend, .. } => *backend,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_gap_is_distinct() {
        let gap = StoreError::unsupported(DriverKind::Memory, "open");
        assert!(gap.is_capability_gap());
        assert_eq!(gap.backend(), DriverKind::Memory);
        assert_eq!(
            gap.to_string(),
            "memory: open is not supported by this driver"
        );

        let outage = StoreError::connection(DriverKind::Postgres, "connection refused");
        assert!(!outage.is_capability_gap());
        assert_eq!(
            outage.to_string(),
            "postgres: connection failed: connection refused"
        );
    }

    #[test]
    fn test_post_write_mentions_operation() {
        let err = StoreError::post_write(DriverKind::MySql, "insert", "broken pipe");
        assert_eq!(
            err.to_string(),
            "mysql: insert applied but could not be completed: broken pipe"
        );
    }
}
