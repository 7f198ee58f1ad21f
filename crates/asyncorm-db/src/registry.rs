//! The set of models known to an ORM instance.
//!
//! Models are registered explicitly; the registry keeps their metadata in
//! registration order and derives the DDL that creates their tables.

use asyncorm_core::{OrmError, OrmResult};

use crate::model::{Model, ModelMeta};
use crate::query::statement::Statement;

/// Registered model metadata, in registration order.
#[derive(Debug, Default, Clone)]
pub struct ModelRegistry {
    models: Vec<&'static ModelMeta>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the model `M`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ConfigurationError`] if a model with the same name
    /// is already registered.
    pub fn register<M: Model>(&mut self) -> OrmResult<()> {
        self.register_meta(M::meta())
    }

    /// Registers a model by its metadata.
    pub fn register_meta(&mut self, meta: &'static ModelMeta) -> OrmResult<()> {
        if self.get(meta.model_name).is_some() {
            return Err(OrmError::ConfigurationError(format!(
                "Model '{}' is already registered",
                meta.model_name
            )));
        }
        self.models.push(meta);
        Ok(())
    }

    /// Looks up a registered model by name.
    pub fn get(&self, model_name: &str) -> Option<&'static ModelMeta> {
        self.models
            .iter()
            .copied()
            .find(|meta| meta.model_name == model_name)
    }

    /// Returns every registered model.
    pub fn models(&self) -> &[&'static ModelMeta] {
        &self.models
    }

    /// Returns the statements creating every registered table.
    ///
    /// All model tables come first, then their foreign key constraints, then
    /// the junction tables, so every referenced table exists by the time it
    /// is referenced.
    pub fn creation_statements(&self) -> Vec<Statement> {
        let tables = self.models.iter().map(|meta| Statement::create_table(meta));
        let constraints = self
            .models
            .iter()
            .flat_map(|meta| Statement::add_constraints(meta));
        let junctions = self
            .models
            .iter()
            .flat_map(|meta| Statement::create_relation_tables(meta));
        tables.chain(constraints).chain(junctions).collect()
    }
}
