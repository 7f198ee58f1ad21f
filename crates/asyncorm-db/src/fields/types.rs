//! Field type definitions.
//!
//! Each [`FieldType`] variant maps to one PostgreSQL column type, and
//! [`FieldDef`] captures everything the ORM needs to know about a single
//! model attribute: its column, nullability, uniqueness, default, allowed
//! choices and, for relations, the referenced table.

use crate::value::Value;

/// The type of a model field, determining its SQL column type and how values
/// are sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Auto-incrementing integer primary key (`serial`).
    AutoField,
    /// Variable-length string bounded by `max_length`.
    CharField,
    /// Unlimited-length text.
    TextField,
    /// 32-bit signed integer.
    IntegerField,
    /// 64-bit signed integer.
    BigIntegerField,
    /// Double precision floating-point number.
    FloatField,
    /// Boolean (true/false).
    BooleanField,
    /// Date without time.
    DateField,
    /// Date and time without timezone.
    DateTimeField,
    /// Email address (a `CharField` with format validation).
    EmailField,
    /// JSON document stored as `jsonb`.
    JsonField,
    /// Many-to-one relationship stored as an integer column.
    ForeignKey {
        /// The referenced table.
        to: String,
        /// The referenced column, usually the primary key.
        to_column: String,
    },
    /// Many-to-many relationship stored in a junction table.
    ManyToMany {
        /// The related table.
        to: String,
        /// The primary key column of the related table.
        to_column: String,
        /// Explicit junction table name. Defaults to `{own_table}_{to}`.
        through: Option<String>,
    },
}

impl FieldType {
    /// A foreign key to `to(id)`.
    pub fn foreign_key(to: impl Into<String>) -> Self {
        Self::ForeignKey {
            to: to.into(),
            to_column: "id".to_string(),
        }
    }

    /// A many-to-many relation to `to(id)` through the default junction table.
    pub fn many_to_many(to: impl Into<String>) -> Self {
        Self::ManyToMany {
            to: to.into(),
            to_column: "id".to_string(),
            through: None,
        }
    }

    /// Returns the PostgreSQL column type for this field.
    ///
    /// `max_length` only affects string types; `CharField` and `EmailField`
    /// fall back to 255 characters.
    pub fn pg_column_type(&self, max_length: Option<usize>) -> String {
        match self {
            Self::AutoField => "serial".to_string(),
            Self::CharField | Self::EmailField => {
                format!("varchar({})", max_length.unwrap_or(255))
            }
            Self::TextField => "text".to_string(),
            Self::IntegerField | Self::ForeignKey { .. } | Self::ManyToMany { .. } => {
                "integer".to_string()
            }
            Self::BigIntegerField => "bigint".to_string(),
            Self::FloatField => "double precision".to_string(),
            Self::BooleanField => "boolean".to_string(),
            Self::DateField => "date".to_string(),
            Self::DateTimeField => "timestamp".to_string(),
            Self::JsonField => "jsonb".to_string(),
        }
    }

    /// Returns `true` for types whose values are stored as integers.
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::AutoField
                | Self::IntegerField
                | Self::BigIntegerField
                | Self::ForeignKey { .. }
                | Self::ManyToMany { .. }
        )
    }
}

/// A default applied when a new instance is inserted without a value.
#[derive(Debug, Clone)]
pub enum FieldDefault {
    /// A fixed value, also rendered into the column's `DEFAULT` clause.
    Value(Value),
    /// A function evaluated at save time.
    Callable(fn() -> Value),
}

impl FieldDefault {
    /// Produces the default value.
    pub fn resolve(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Callable(f) => f(),
        }
    }
}

/// The junction table of a many-to-many field, resolved against the owning
/// model by [`ModelMeta::new`](crate::model::ModelMeta::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junction {
    /// The junction table name.
    pub table: String,
    /// Column holding the owning model's primary key.
    pub own_column: String,
    /// The owning model's table.
    pub own_table: String,
    /// The owning model's primary key column.
    pub own_pk: String,
    /// Column holding the related model's primary key.
    pub foreign_column: String,
    /// The related model's table.
    pub foreign_table: String,
    /// The related model's primary key column.
    pub foreign_pk: String,
}

/// Complete definition of a model field.
///
/// Built with [`FieldDef::new`] and the builder methods below, then handed
/// to [`ModelMeta::new`](crate::model::ModelMeta::new).
///
/// # Examples
///
/// ```
/// use asyncorm_db::fields::{FieldDef, FieldType};
///
/// let name = FieldDef::new("name", FieldType::CharField).max_length(50).unique();
/// assert_eq!(name.column_definition(), "name varchar(50) NOT NULL UNIQUE");
/// ```
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// The Rust attribute name of this field.
    pub name: &'static str,
    /// The database column name (may differ from `name`).
    pub column: String,
    /// The type of this field.
    pub field_type: FieldType,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether NULL is allowed in the database.
    pub null: bool,
    /// Whether a UNIQUE constraint is applied.
    pub unique: bool,
    /// Default used when inserting without a value.
    pub default: Option<FieldDefault>,
    /// Maximum character length for string fields.
    pub max_length: Option<usize>,
    /// Allowed values as (value, display label) pairs.
    pub choices: Option<Vec<(Value, String)>>,
    /// Whether the field is set to the current date/time on every save.
    pub auto_now: bool,
    /// The resolved junction table, for many-to-many fields only.
    pub junction: Option<Junction>,
}

impl FieldDef {
    /// Creates a new `FieldDef` with sensible defaults.
    ///
    /// An `AutoField` is a primary key; every other field starts non-null,
    /// non-unique and without a default.
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        let primary_key = field_type == FieldType::AutoField;
        Self {
            name,
            column: name.to_string(),
            field_type,
            primary_key,
            null: false,
            unique: false,
            default: None,
            max_length: None,
            choices: None,
            auto_now: false,
            junction: None,
        }
    }

    /// Sets the database column name.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Marks this field as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows NULL values in the database.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Marks this field as having a UNIQUE constraint.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the maximum character length.
    #[must_use]
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Sets a fixed default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    /// Sets a default computed at save time.
    #[must_use]
    pub fn default_fn(mut self, f: fn() -> Value) -> Self {
        self.default = Some(FieldDefault::Callable(f));
        self
    }

    /// Restricts the field to the given `(value, label)` choices.
    #[must_use]
    pub fn choices<V, L>(mut self, choices: impl IntoIterator<Item = (V, L)>) -> Self
    where
        V: Into<Value>,
        L: Into<String>,
    {
        self.choices = Some(
            choices
                .into_iter()
                .map(|(v, l)| (v.into(), l.into()))
                .collect(),
        );
        self
    }

    /// Sets the field to the current date/time on every save.
    #[must_use]
    pub const fn auto_now(mut self) -> Self {
        self.auto_now = true;
        self
    }

    /// Returns `true` for many-to-many fields, which have no column in the
    /// owning table.
    pub const fn is_many_to_many(&self) -> bool {
        matches!(self.field_type, FieldType::ManyToMany { .. })
    }

    /// Returns `true` for foreign key and many-to-many fields.
    pub const fn is_relation(&self) -> bool {
        matches!(
            self.field_type,
            FieldType::ForeignKey { .. } | FieldType::ManyToMany { .. }
        )
    }

    /// Returns the column definition used inside `CREATE TABLE`.
    pub fn column_definition(&self) -> String {
        let sql_type = self.field_type.pg_column_type(self.max_length);
        format!("{} {sql_type}{}", self.column, self.constraint_fragment())
    }

    /// Returns the inline constraints of the column: primary key, nullability,
    /// uniqueness and a fixed default.
    pub fn constraint_fragment(&self) -> String {
        if self.primary_key {
            return " PRIMARY KEY".to_string();
        }

        let mut fragment = String::from(if self.null { " NULL" } else { " NOT NULL" });
        if self.unique {
            fragment.push_str(" UNIQUE");
        }
        if let Some(FieldDefault::Value(v)) = &self.default {
            fragment.push_str(" DEFAULT ");
            fragment.push_str(&v.to_sql_literal());
        }
        fragment
    }

    /// Returns the constraint that must be added after the table exists, as
    /// `(constraint name, definition)`. Only foreign keys have one.
    pub fn trailing_constraint(&self, table: &str) -> Option<(String, String)> {
        match &self.field_type {
            FieldType::ForeignKey { to, to_column } => Some((
                format!("{table}_{}_fkey", self.column),
                format!(
                    "FOREIGN KEY ({}) REFERENCES {to}({to_column})",
                    self.column
                ),
            )),
            _ => None,
        }
    }
}
