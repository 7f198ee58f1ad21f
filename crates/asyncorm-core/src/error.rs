//! Error types for asyncorm.
//!
//! [`OrmError`] covers every failure the ORM can surface: lookups that match
//! the wrong number of rows, malformed filters, field sanitization failures,
//! backend errors and configuration problems. Errors always propagate to the
//! immediate caller; nothing is retried.

use thiserror::Error;

/// The error type returned by every fallible asyncorm operation.
#[derive(Error, Debug)]
pub enum OrmError {
    // ── Queryset errors ──────────────────────────────────────────────

    /// A `get` matched no row.
    #[error("{0}")]
    DoesNotExist(String),

    /// A `get` matched more than one row.
    #[error("{0}")]
    MultipleObjectsReturned(String),

    /// A filter value had the wrong shape (e.g. a range tuple that is not a pair).
    #[error("Queryset error: {0}")]
    QuerysetError(String),

    /// A lookup named an unknown field or operator.
    #[error("Lookup error: {0}")]
    LookupError(String),

    // ── Model errors ─────────────────────────────────────────────────

    /// A model-level precondition failed, or a save violated a unique constraint.
    #[error("{0}")]
    ModelError(String),

    /// A field rejected a value during sanitization.
    #[error("Field error: {0}")]
    FieldError(String),

    // ── Database errors ──────────────────────────────────────────────

    /// The backend reported a uniqueness violation.
    #[error("Unique violation: {0}")]
    UniqueViolation(String),

    /// Any other statement failure reported by the backend.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Connection or pool failure, including a connection already marked failed.
    #[error("Operational error: {0}")]
    OperationalError(String),

    // ── Configuration ────────────────────────────────────────────────

    /// Invalid settings or an inconsistent model registry.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// JSON or TOML conversion failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OrmError {
    /// Returns `true` when a lookup matched no row.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::DoesNotExist(_))
    }

    /// Returns `true` when a lookup matched several rows.
    pub const fn is_multiple(&self) -> bool {
        matches!(self, Self::MultipleObjectsReturned(_))
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, OrmError>`.
pub type OrmResult<T> = Result<T, OrmError>;
