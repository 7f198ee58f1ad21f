//! # asyncorm-db-backends
//!
//! Database drivers for asyncorm. Each backend implements
//! [`DbExecutor`](asyncorm_db::DbExecutor) so the gateway can run statements
//! through it.
//!
//! Supported backends:
//! - `PostgreSQL` (feature `postgres`, enabled by default)

pub mod base;
#[cfg(feature = "postgres")]
pub mod postgresql;

pub use base::DatabaseConfig;
#[cfg(feature = "postgres")]
pub use postgresql::{ConnectionState, PostgresBackend};
