//! The driver-facing executor trait.
//!
//! [`DbExecutor`] is the bridge between the ORM (`asyncorm-db`) and a
//! concrete driver (`asyncorm-db-backends`). It lives in this crate so the
//! gateway can be written without depending on any driver.

use async_trait::async_trait;

use crate::row::Row;
use crate::value::Value;
use asyncorm_core::OrmResult;

/// Minimal async database executor.
///
/// Implementations run each call inside one transaction: commit when the
/// statement succeeds, roll back when it fails, and release the connection
/// on every exit path.
#[async_trait]
pub trait DbExecutor: Send + Sync {
    /// Runs one statement in its own transaction and returns every row it
    /// produced.
    async fn fetch_in_transaction(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>>;

    /// Runs several statements, in order, inside a single transaction.
    async fn execute_batch_in_transaction(&self, statements: &[(String, Vec<Value>)])
        -> OrmResult<()>;

    /// Releases the underlying connection. Executors without one do nothing.
    async fn close(&self) -> OrmResult<()> {
        Ok(())
    }
}
