//! Read access to the rows of one model.
//!
//! A [`QuerySet`] is a stateless facade bound to a model type and a shared
//! [`DatabaseGateway`]. Every method builds one [`Statement`], sends it and
//! materializes the returned rows; nothing is cached between calls.

use std::marker::PhantomData;
use std::sync::Arc;

use asyncorm_core::{OrmError, OrmResult};

use super::filters::{compile_filters, Condition, Filters};
use super::statement::Statement;
use crate::gateway::DatabaseGateway;
use crate::materializer::model_constructor;
use crate::model::{Model, ModelMeta};
use crate::value::Value;

/// Selects the rows of a model related to one instance of another model
/// through a junction table.
#[derive(Debug, Clone, PartialEq)]
pub struct M2mFilter {
    /// Junction table name.
    pub junction: String,
    /// Junction column referencing the owning instance.
    pub my_column: String,
    /// Junction column referencing the rows returned.
    pub other_column: String,
    /// Primary key of the owning instance.
    pub my_id: Value,
}

impl M2mFilter {
    /// Builds the filter for the many-to-many field `field` of `meta`, as
    /// seen from the instance whose primary key is `my_id`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::LookupError`] if `field` is not a many-to-many
    /// field of `meta`.
    pub fn from_field(meta: &ModelMeta, field: &str, my_id: impl Into<Value>) -> OrmResult<Self> {
        let junction = meta
            .field(field)
            .and_then(|f| f.junction.as_ref())
            .ok_or_else(|| {
                OrmError::LookupError(format!(
                    "{} has no many to many field named '{field}'",
                    meta.model_name
                ))
            })?;
        Ok(Self {
            junction: junction.table.clone(),
            my_column: junction.own_column.clone(),
            other_column: junction.foreign_column.clone(),
            my_id: my_id.into(),
        })
    }
}

/// Query operations for the model `M`.
pub struct QuerySet<M: Model> {
    gateway: Arc<DatabaseGateway>,
    model: PhantomData<M>,
}

impl<M: Model> Clone for QuerySet<M> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.gateway))
    }
}

impl<M: Model> std::fmt::Debug for QuerySet<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySet")
            .field("model", &M::model_name())
            .finish_non_exhaustive()
    }
}

impl<M: Model> QuerySet<M> {
    /// Creates a queryset sending its statements through `gateway`.
    pub const fn new(gateway: Arc<DatabaseGateway>) -> Self {
        Self {
            gateway,
            model: PhantomData,
        }
    }

    /// Returns the gateway this queryset uses.
    pub fn gateway(&self) -> &Arc<DatabaseGateway> {
        &self.gateway
    }

    /// Returns every row of the table, unordered.
    pub async fn all(&self) -> OrmResult<Vec<M>> {
        let statement = Statement::SelectAll {
            table: M::table_name().to_string(),
        };
        self.fetch(&statement).await
    }

    /// Alias of [`QuerySet::all`].
    pub async fn queryset(&self) -> OrmResult<Vec<M>> {
        self.all().await
    }

    /// Returns the number of rows in the table.
    pub async fn count(&self) -> OrmResult<i64> {
        let statement = Statement::Count {
            table: M::table_name().to_string(),
        };
        self.gateway.request(&statement).await?.into_count()
    }

    /// Returns the rows matching every filter, in the model's default
    /// ordering.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::LookupError`] or [`OrmError::QuerysetError`] for
    /// malformed filters, and propagates gateway errors.
    pub async fn filter(&self, filters: Filters) -> OrmResult<Vec<M>> {
        let condition = compile_filters(M::meta(), &filters, false)?;
        self.select(condition).await
    }

    /// Returns the rows matching none of the filters, in the model's default
    /// ordering.
    pub async fn exclude(&self, filters: Filters) -> OrmResult<Vec<M>> {
        let condition = compile_filters(M::meta(), &filters, true)?;
        self.select(condition).await
    }

    /// Returns the single row matching the filters.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::DoesNotExist`] when nothing matches and
    /// [`OrmError::MultipleObjectsReturned`] when more than one row does.
    pub async fn get(&self, filters: Filters) -> OrmResult<M> {
        let mut found = self.filter(filters).await?;
        match found.len() {
            0 => Err(OrmError::DoesNotExist(format!(
                "That {} does not exist",
                M::model_name()
            ))),
            1 => Ok(found.remove(0)),
            n => Err(OrmError::MultipleObjectsReturned(format!(
                "More than one {} were returned, there are {n}!",
                M::model_name()
            ))),
        }
    }

    /// Returns the rows of `M` related through the junction described by
    /// `m2m_filter`.
    pub async fn filter_m2m(&self, m2m_filter: M2mFilter) -> OrmResult<Vec<M>> {
        let meta = M::meta();
        let statement = Statement::SelectRelated {
            table: meta.table.clone(),
            pk_column: meta.pk_column().to_string(),
            junction: m2m_filter.junction,
            other_column: m2m_filter.other_column,
            my_column: m2m_filter.my_column,
            my_id: m2m_filter.my_id,
            ordering: meta.ordering.clone(),
        };
        self.fetch(&statement).await
    }

    /// Reads the related ids stored in a junction table.
    ///
    /// Selects `other_column` of `table_name` as `M`'s primary key column
    /// where `my_column` equals `my_id`, so each returned instance only
    /// carries its primary key.
    pub async fn m2m(
        &self,
        table_name: &str,
        my_column: &str,
        other_column: &str,
        my_id: impl Into<Value>,
    ) -> OrmResult<Vec<M>> {
        let meta = M::meta();
        let pk_column = meta.pk_column();
        let statement = Statement::Select {
            table: table_name.to_string(),
            columns: vec![format!("{other_column} AS {pk_column}")],
            condition: Some(Condition::equals(my_column, my_id.into())),
            ordering: meta
                .ordering
                .iter()
                .filter(|o| o.column == pk_column)
                .cloned()
                .collect(),
        };
        self.fetch(&statement).await
    }

    async fn select(&self, condition: Condition) -> OrmResult<Vec<M>> {
        let meta = M::meta();
        let statement = Statement::Select {
            table: meta.table.clone(),
            columns: Vec::new(),
            condition: Some(condition),
            ordering: meta.ordering.clone(),
        };
        self.fetch(&statement).await
    }

    async fn fetch(&self, statement: &Statement) -> OrmResult<Vec<M>> {
        self.gateway
            .request(statement)
            .await?
            .into_rows()
            .iter()
            .map(|row| model_constructor(row, None))
            .collect()
    }
}
