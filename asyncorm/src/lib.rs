//! # asyncorm
//!
//! An async ORM for PostgreSQL.
//!
//! This is the meta-crate that re-exports the sub-crates and provides
//! [`Orm`], which wires a connection, the registered models and their
//! managers together. Depend on the individual crates for finer-grained
//! control.
//!
//! ```ignore
//! let settings = asyncorm::core::settings_loader::from_toml_file_with_env("asyncorm.toml")?;
//! let mut orm = asyncorm::Orm::connect(&settings).await?;
//! orm.register::<Book>()?.register::<Author>()?;
//! orm.sync_db().await?;
//!
//! let books = orm.manager::<Book>();
//! let cheap = books.filter(Filters::new().with("price__lt", 10)).await?;
//! ```

use std::sync::Arc;

use tracing::info;

/// Error types, settings, and logging setup.
pub use asyncorm_core as core;

/// ORM: models, fields, filters, statements, querysets and managers.
pub use asyncorm_db as db;

/// Database backends: `PostgreSQL`.
pub use asyncorm_db_backends as db_backends;

pub use asyncorm_core::{OrmError, OrmResult, Settings};
pub use asyncorm_db::{
    DatabaseGateway, DbExecutor, FieldDef, FieldType, Filters, M2mFilter, Manager, Model,
    ModelMeta, ModelRegistry, QuerySet, Value,
};

/// A configured ORM: one gateway shared by every manager, plus the models
/// whose tables it manages.
#[derive(Debug)]
pub struct Orm {
    gateway: Arc<DatabaseGateway>,
    registry: ModelRegistry,
}

impl Orm {
    /// Connects to the database described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::OperationalError`] if the database cannot be
    /// reached.
    #[cfg(feature = "postgres")]
    pub async fn connect(settings: &Settings) -> OrmResult<Self> {
        let config = asyncorm_db_backends::DatabaseConfig::from_settings(&settings.database);
        let backend = asyncorm_db_backends::PostgresBackend::connect(&config).await?;
        Ok(Self::with_executor(Arc::new(backend)))
    }

    /// Loads settings from a TOML file (with `ASYNCORM_*` overrides),
    /// installs logging and connects.
    #[cfg(feature = "postgres")]
    pub async fn configure(path: impl AsRef<std::path::Path>) -> OrmResult<Self> {
        let settings = asyncorm_core::settings_loader::from_toml_file_with_env(path)?;
        asyncorm_core::logging::setup_logging(&settings);
        Self::connect(&settings).await
    }

    /// Builds an ORM over an existing executor.
    pub fn with_executor(executor: Arc<dyn DbExecutor>) -> Self {
        Self {
            gateway: Arc::new(DatabaseGateway::new(executor)),
            registry: ModelRegistry::new(),
        }
    }

    /// Registers the model `M`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ConfigurationError`] if `M` is already registered.
    pub fn register<M: Model>(&mut self) -> OrmResult<&mut Self> {
        self.registry.register::<M>()?;
        Ok(self)
    }

    /// Returns the registered models.
    pub const fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Returns the shared gateway.
    pub const fn gateway(&self) -> &Arc<DatabaseGateway> {
        &self.gateway
    }

    /// Creates the tables, constraints and junction tables of every
    /// registered model in one transaction. Existing tables are kept.
    pub async fn sync_db(&self) -> OrmResult<()> {
        let statements = self.registry.creation_statements();
        info!(
            models = self.registry.models().len(),
            statements = statements.len(),
            "synchronizing database schema"
        );
        self.gateway.request_batch(&statements).await
    }

    /// Returns the manager of `M`.
    pub fn manager<M: Model>(&self) -> Manager<M> {
        Manager::new(Arc::clone(&self.gateway))
    }

    /// Returns the held connection to the pool. A later call acquires a new
    /// one.
    pub async fn close(&self) -> OrmResult<()> {
        self.gateway.executor().close().await
    }
}
