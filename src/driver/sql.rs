//! Pieces shared by the relational drivers.
//!
//! Both drivers open a fresh connection per operation and close it before
//! returning. The statements differ only in placeholder syntax.

use sqlx::Connection;
use tracing::warn;

use super::DriverKind;
use crate::error::{StoreError, StoreResult};

/// Close a connection that carried a read or a handshake.
///
/// A failed close is logged; the caller's result stands.
pub(crate) async fn close_quietly<C: Connection>(conn: C, backend: DriverKind) {
    if let Err(e) = conn.close().await {
        warn!("{}: failed to close connection: {}", backend, e);
    }
}

/// Close the connection that carried a write and turn the outcome into an affected count.
///
/// When the statement succeeded but the close fails, the mutation has already
/// been applied and the error is reported as [`StoreError::PostWrite`].
pub(crate) async fn finish_write<C: Connection>(
    conn: C,
    backend: DriverKind,
    operation: &'static str,
    result: Result<u64, sqlx::Error>,
) -> StoreResult<u64> {
    match result {
        Ok(affected) => {
            conn.close()
                .await
                .map_err(|e| StoreError::post_write(backend, operation, e))?;
            Ok(affected)
        }
        Err(e) => {
            close_quietly(conn, backend).await;
            Err(StoreError::query(backend, e))
        }
    }
}
