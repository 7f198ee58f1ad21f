//! Write access to the rows of one model.
//!
//! [`Manager`] adds `save` and `delete` to the read operations of
//! [`QuerySet`], which it dereferences to.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use asyncorm_core::{OrmError, OrmResult};
use tracing::debug;

use super::filters::Condition;
use super::queryset::QuerySet;
use super::statement::Statement;
use crate::gateway::DatabaseGateway;
use crate::materializer::populate;
use crate::model::Model;
use crate::value::Value;

/// The entry point for reading and writing instances of `M`.
///
/// # Examples
///
/// ```ignore
/// let books = orm.manager::<Book>();
/// let mut book = Book { name: "Dune".into(), ..Default::default() };
/// books.save(&mut book).await?;
/// let found = books.get(Filters::new().with("name", "Dune")).await?;
/// ```
pub struct Manager<M: Model> {
    queryset: QuerySet<M>,
}

impl<M: Model> Clone for Manager<M> {
    fn clone(&self) -> Self {
        Self {
            queryset: self.queryset.clone(),
        }
    }
}

impl<M: Model> std::fmt::Debug for Manager<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("model", &M::model_name())
            .finish_non_exhaustive()
    }
}

impl<M: Model> Deref for Manager<M> {
    type Target = QuerySet<M>;

    fn deref(&self) -> &Self::Target {
        &self.queryset
    }
}

impl<M: Model> Manager<M> {
    /// Creates a manager sending its statements through `gateway`.
    pub const fn new(gateway: Arc<DatabaseGateway>) -> Self {
        Self {
            queryset: QuerySet::new(gateway),
        }
    }

    /// Inserts `instance` when it has no primary key, updates its row
    /// otherwise, then stores its many-to-many relations.
    ///
    /// The row returned by the database is written back into `instance`, so
    /// a freshly inserted instance carries its new primary key.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::FieldError`] when a value is rejected by its
    /// field and [`OrmError::ModelError`] when the row violates a unique
    /// constraint. Other gateway errors propagate unchanged.
    pub async fn save(&self, instance: &mut M) -> OrmResult<()> {
        let meta = M::meta();
        let pk = instance.pk();
        let inserting = pk.is_none();
        let pk_name = meta.pk_field().name;

        let mut provided: HashMap<&str, Value> = instance.field_values().into_iter().collect();
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for field in meta.column_fields().filter(|f| f.name != pk_name) {
            let value = match provided.remove(field.name) {
                Some(value) => value,
                None if field.auto_now || (inserting && field.default.is_some()) => Value::Null,
                None => continue,
            };
            columns.push(field.column.clone());
            values.push(field.value_for_save(value, inserting)?);
        }

        let m2m_values = instance.m2m_values();

        let statement = match pk {
            None => Some(Statement::Insert {
                table: meta.table.clone(),
                columns,
                values,
            }),
            Some(_) if columns.is_empty() => None,
            Some(pk_value) => Some(Statement::Update {
                table: meta.table.clone(),
                columns,
                values,
                pk_column: meta.pk_column().to_string(),
                pk_value,
            }),
        };

        if let Some(statement) = statement {
            let row = self
                .gateway()
                .request(&statement)
                .await
                .map_err(|err| match err {
                    OrmError::UniqueViolation(_) => {
                        OrmError::ModelError("The model violates a unique constraint".to_string())
                    }
                    other => other,
                })?
                .into_row()?;
            populate(instance, &row)?;
        }

        self.save_relations(instance, m2m_values).await
    }

    /// Deletes the row of `instance`. Its junction rows go with it through
    /// the `ON DELETE CASCADE` of the junction tables.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ModelError`] if the instance has never been
    /// saved.
    pub async fn delete(&self, instance: &M) -> OrmResult<()> {
        let meta = M::meta();
        let pk = instance.pk().ok_or_else(|| {
            OrmError::ModelError(format!(
                "Cannot delete a {} that has no primary key",
                meta.model_name
            ))
        })?;
        let statement = Statement::Delete {
            table: meta.table.clone(),
            condition: Condition::equals(meta.pk_column(), pk),
        };
        self.gateway().request(&statement).await?;
        Ok(())
    }

    async fn save_relations(
        &self,
        instance: &M,
        m2m_values: Vec<(&'static str, Value)>,
    ) -> OrmResult<()> {
        let meta = M::meta();
        for (name, value) in m2m_values {
            let Some(field) = meta.field(name) else {
                continue;
            };
            let Some(junction) = field.junction.as_ref() else {
                continue;
            };
            let related = match field.sanitize(value)? {
                Value::List(items) => items,
                Value::Null => Vec::new(),
                single => vec![single],
            };
            if related.is_empty() {
                continue;
            }

            let own_id = instance.pk().ok_or_else(|| {
                OrmError::ModelError(format!(
                    "Cannot relate a {} that has no primary key",
                    meta.model_name
                ))
            })?;
            debug!(junction = %junction.table, count = related.len(), "saving relations");
            for related_id in related {
                let statement = Statement::Insert {
                    table: junction.table.clone(),
                    columns: vec![junction.own_column.clone(), junction.foreign_column.clone()],
                    values: vec![own_id.clone(), related_id],
                };
                self.gateway().request(&statement).await?;
            }
        }
        Ok(())
    }
}
