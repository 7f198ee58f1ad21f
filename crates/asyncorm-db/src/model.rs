//! Model trait and schema metadata.
//!
//! The [`Model`] trait is what every mapped type implements: it exposes the
//! static [`ModelMeta`] descriptor, the instance's field values and a setter
//! used when rows are materialized.
//!
//! [`ModelMeta`] is built once per model (typically in a `LazyLock`) and is
//! immutable afterwards. Construction resolves the primary key, the column
//! names used by ordering and unique-together, and the junction table of
//! every many-to-many field.

use asyncorm_core::OrmResult;

use crate::fields::{FieldDef, FieldType, Junction};
use crate::query::statement::OrderBy;
use crate::value::Value;

/// The core trait for all mapped models.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
///
/// use asyncorm_core::OrmResult;
/// use asyncorm_db::fields::{FieldDef, FieldType};
/// use asyncorm_db::model::{Model, ModelMeta};
/// use asyncorm_db::value::Value;
///
/// #[derive(Debug, Default)]
/// struct Publisher {
///     id: Option<i64>,
///     name: String,
/// }
///
/// impl Model for Publisher {
///     fn meta() -> &'static ModelMeta {
///         static META: LazyLock<ModelMeta> = LazyLock::new(|| {
///             ModelMeta::new(
///                 "Publisher",
///                 vec![FieldDef::new("name", FieldType::CharField).max_length(50)],
///             )
///         });
///         &META
///     }
///
///     fn field_values(&self) -> Vec<(&'static str, Value)> {
///         vec![("id", self.id.into()), ("name", self.name.as_str().into())]
///     }
///
///     fn set_field(&mut self, field: &str, value: Value) -> OrmResult<()> {
///         match field {
///             "id" => self.id = value.as_int(),
///             "name" => self.name = value.as_str().unwrap_or_default().to_string(),
///             _ => {}
///         }
///         Ok(())
///     }
/// }
///
/// assert_eq!(Publisher::table_name(), "publisher");
/// assert_eq!(Publisher { id: Some(3), ..Default::default() }.pk(), Some(Value::Int(3)));
/// ```
pub trait Model: Default + Send + Sync + 'static {
    /// Returns the static metadata for this model type.
    fn meta() -> &'static ModelMeta;

    /// Returns the scalar field values keyed by field name, primary key included.
    fn field_values(&self) -> Vec<(&'static str, Value)>;

    /// Returns the many-to-many values keyed by field name. Each value is a
    /// single related id, a list of ids, or `Null`.
    fn m2m_values(&self) -> Vec<(&'static str, Value)> {
        Vec::new()
    }

    /// Stores a value read from the database into the named field.
    fn set_field(&mut self, field: &str, value: Value) -> OrmResult<()>;

    /// Returns the primary key value, or `None` if the instance is unsaved.
    fn pk(&self) -> Option<Value> {
        let pk_name = Self::meta().pk_field().name;
        self.field_values()
            .into_iter()
            .find(|(name, _)| *name == pk_name)
            .map(|(_, value)| value)
            .filter(|value| !value.is_null())
    }

    /// Returns the model name used in error messages.
    fn model_name() -> &'static str {
        Self::meta().model_name
    }

    /// Returns the database table name.
    fn table_name() -> &'static str {
        Self::meta().table.as_str()
    }
}

/// Schema descriptor of one model.
#[derive(Debug, Clone)]
pub struct ModelMeta {
    /// The model name (e.g. "Book").
    pub model_name: &'static str,
    /// The database table name.
    pub table: String,
    /// Field definitions in declaration order.
    pub fields: Vec<FieldDef>,
    /// Default ordering for filtered queries, by column.
    pub ordering: Vec<OrderBy>,
    /// Columns that must be unique together.
    pub unique_together: Vec<String>,
    pk_index: usize,
}

impl ModelMeta {
    /// Creates the descriptor of `model_name` stored in the lowercased model
    /// name as table.
    ///
    /// If no field is a primary key, an `id` auto field is prepended.
    pub fn new(model_name: &'static str, mut fields: Vec<FieldDef>) -> Self {
        let pk_index = match fields.iter().position(|f| f.primary_key) {
            Some(idx) => idx,
            None => {
                fields.insert(0, FieldDef::new("id", FieldType::AutoField));
                0
            }
        };

        let mut meta = Self {
            model_name,
            table: model_name.to_lowercase(),
            fields,
            ordering: Vec::new(),
            unique_together: Vec::new(),
            pk_index,
        };
        meta.resolve_junctions();
        meta
    }

    /// Overrides the table name.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self.resolve_junctions();
        self
    }

    /// Sets the default ordering from field names; a leading `-` sorts
    /// descending.
    #[must_use]
    pub fn ordering(mut self, ordering: &[&str]) -> Self {
        self.ordering = ordering
            .iter()
            .map(|term| {
                let mut order = OrderBy::parse(term);
                order.column = self.column_for(&order.column);
                order
            })
            .collect();
        self
    }

    /// Declares a set of fields that must be unique together.
    #[must_use]
    pub fn unique_together(mut self, fields: &[&str]) -> Self {
        self.unique_together = fields.iter().map(|f| self.column_for(f)).collect();
        self
    }

    /// Returns the primary key field.
    pub fn pk_field(&self) -> &FieldDef {
        &self.fields[self.pk_index]
    }

    /// Returns the primary key column.
    pub fn pk_column(&self) -> &str {
        &self.pk_field().column
    }

    /// Looks up a field by its attribute name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a field stored in the given column of the model's table.
    pub fn field_by_column(&self, column: &str) -> Option<&FieldDef> {
        self.column_fields().find(|f| f.column == column)
    }

    /// Fields that have a column in the model's table.
    pub fn column_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.is_many_to_many())
    }

    /// Many-to-many fields.
    pub fn m2m_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_many_to_many())
    }

    fn column_for(&self, name: &str) -> String {
        self.field(name)
            .map_or_else(|| name.to_string(), |f| f.column.clone())
    }

    fn resolve_junctions(&mut self) {
        let own_table = self.table.clone();
        let own_pk = self.pk_column().to_string();

        for field in &mut self.fields {
            let FieldType::ManyToMany {
                to,
                to_column,
                through,
            } = &field.field_type
            else {
                continue;
            };

            let (own_column, foreign_column) = if *to == own_table {
                (format!("from_{own_table}"), format!("to_{to}"))
            } else {
                (own_table.clone(), to.clone())
            };

            field.junction = Some(Junction {
                table: through
                    .clone()
                    .unwrap_or_else(|| format!("{own_table}_{to}")),
                own_column,
                own_table: own_table.clone(),
                own_pk: own_pk.clone(),
                foreign_column,
                foreign_table: to.clone(),
                foreign_pk: to_column.clone(),
            });
        }
    }
}
