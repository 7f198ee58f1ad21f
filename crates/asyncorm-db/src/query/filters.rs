//! Keyword-style filters and their compilation into SQL conditions.
//!
//! A filter key is a field name optionally followed by `__` and an operator
//! suffix (`gt`, `lt`, `gte`, `lte`). A plain key compares for equality, and
//! a two-element tuple value compiles to an exclusive range.
//!
//! # Examples
//!
//! ```
//! use asyncorm_db::query::filters::Filters;
//!
//! let filters = Filters::new().with("name__gte", "M").range("age", 18, 30);
//! assert_eq!(filters.len(), 2);
//! ```

use std::fmt;

use asyncorm_core::{OrmError, OrmResult};

use crate::model::ModelMeta;
use crate::value::Value;

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Eq,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
}

impl Operator {
    /// Resolves a key suffix such as `gte`.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            "gte" => Some(Self::Gte),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    /// Returns the SQL operator.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }
}

/// The value side of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// A single value.
    Scalar(Value),
    /// A tuple of values. Only pairs are accepted, as exclusive range bounds.
    Tuple(Vec<Value>),
}

/// An ordered set of filters. Compiled conditions follow insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    entries: Vec<(String, FilterValue)>,
}

impl Filters {
    /// Creates an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key = value` (or `key__op`).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key, FilterValue::Scalar(value.into()));
        self
    }

    /// Adds an exclusive range `low < key < high`.
    #[must_use]
    pub fn range(mut self, key: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.push(key, FilterValue::Tuple(vec![low.into(), high.into()]));
        self
    }

    /// Adds a tuple of arbitrary length.
    #[must_use]
    pub fn tuple(mut self, key: impl Into<String>, values: Vec<Value>) -> Self {
        self.push(key, FilterValue::Tuple(values));
        self
    }

    /// Appends a filter entry.
    pub fn push(&mut self, key: impl Into<String>, value: FilterValue) {
        self.entries.push((key.into(), value));
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Compare {
        column: String,
        op: Operator,
        value: Value,
    },
    Between {
        column: String,
        low: Value,
        high: Value,
    },
}

/// One boolean fragment of a condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    negated: bool,
    predicate: Predicate,
}

impl Fragment {
    fn render(&self, qualifier: Option<&str>, params: &mut Vec<Value>, inline: bool) -> String {
        let mut bind = |value: &Value| {
            if inline {
                value.to_sql_literal()
            } else {
                params.push(value.clone());
                format!("${}", params.len())
            }
        };
        let qualify = |column: &str| match qualifier {
            Some(table) => format!("{table}.{column}"),
            None => column.to_string(),
        };

        let body = match &self.predicate {
            Predicate::Compare { column, op, value } => {
                format!("{}{}{}", qualify(column), op.as_sql(), bind(value))
            }
            Predicate::Between { column, low, high } => {
                let column = qualify(column);
                let low = bind(low);
                let high = bind(high);
                format!("({column}>{low} AND {column}<{high})")
            }
        };

        if self.negated {
            format!("NOT {body}")
        } else {
            body
        }
    }
}

/// A conjunction of fragments, rendered with `$n` placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    fragments: Vec<Fragment>,
}

impl Condition {
    /// A single `column=value` predicate.
    pub fn equals(column: impl Into<String>, value: Value) -> Self {
        Self {
            fragments: vec![Fragment {
                negated: false,
                predicate: Predicate::Compare {
                    column: column.into(),
                    op: Operator::Eq,
                    value,
                },
            }],
        }
    }

    /// Returns the fragments in order.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Returns `true` if the condition has no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Renders each fragment separately, numbering placeholders from `$1`.
    pub fn fragment_sql(&self) -> (Vec<String>, Vec<Value>) {
        let mut params = Vec::new();
        let parts = self
            .fragments
            .iter()
            .map(|f| f.render(None, &mut params, false))
            .collect();
        (parts, params)
    }

    /// Renders the condition standalone, numbering placeholders from `$1`.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let sql = self.render(None, &mut params);
        (sql, params)
    }

    /// Renders the condition with literal values, for logs and debugging.
    pub fn render_inline(&self) -> String {
        let mut unused = Vec::new();
        self.fragments
            .iter()
            .map(|f| f.render(None, &mut unused, true))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Renders the condition, appending bound values to `params`. Columns are
    /// prefixed with `qualifier` when given.
    pub(crate) fn render(&self, qualifier: Option<&str>, params: &mut Vec<Value>) -> String {
        self.fragments
            .iter()
            .map(|f| f.render(qualifier, params, false))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_inline())
    }
}

/// Compiles `filters` against `meta` into a condition.
///
/// Every value is sanitized by the field it targets. With `exclude`, each
/// fragment is negated on its own (`NOT a=$1 AND NOT b=$2`).
///
/// # Errors
///
/// - [`OrmError::LookupError`] for an unknown field or operator suffix.
/// - [`OrmError::QuerysetError`] for a tuple that is not a pair, or a tuple
///   combined with an operator.
/// - [`OrmError::FieldError`] when a value fails sanitization.
pub fn compile_filters(meta: &ModelMeta, filters: &Filters, exclude: bool) -> OrmResult<Condition> {
    let mut fragments = Vec::with_capacity(filters.len());

    for (key, value) in filters.iter() {
        let (name, op) = match key.split_once("__") {
            Some((name, suffix)) => {
                let op = Operator::from_suffix(suffix).ok_or_else(|| {
                    OrmError::LookupError(format!(
                        "Unsupported lookup '{suffix}' in filter '{key}'"
                    ))
                })?;
                (name, op)
            }
            None => (key, Operator::Eq),
        };

        let field = meta
            .field(name)
            .or_else(|| meta.field_by_column(name))
            .filter(|f| !f.is_many_to_many())
            .ok_or_else(|| {
                OrmError::LookupError(format!(
                    "Cannot resolve keyword '{name}' into a field of {}",
                    meta.model_name
                ))
            })?;
        let column = field.column.clone();

        let predicate = match value {
            FilterValue::Scalar(v) => Predicate::Compare {
                column,
                op,
                value: field.sanitize(v.clone())?,
            },
            FilterValue::Tuple(_) if op != Operator::Eq => {
                return Err(OrmError::QuerysetError(format!(
                    "Filter '{key}' cannot combine a tuple with an operator"
                )));
            }
            FilterValue::Tuple(values) => match values.as_slice() {
                [low, high] => Predicate::Between {
                    column,
                    low: field.sanitize(low.clone())?,
                    high: field.sanitize(high.clone())?,
                },
                _ => {
                    return Err(OrmError::QuerysetError(
                        "Not a correct tuple definition, filter only allows tuples of size 2"
                            .to_string(),
                    ));
                }
            },
        };

        fragments.push(Fragment {
            negated: exclude,
            predicate,
        });
    }

    Ok(Condition { fragments })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldDef, FieldType};

    fn author_meta() -> ModelMeta {
        ModelMeta::new(
            "Author",
            vec![
                FieldDef::new("na", FieldType::AutoField).column("uid"),
                FieldDef::new("name", FieldType::CharField).max_length(50),
                FieldDef::new("age", FieldType::IntegerField),
                FieldDef::new("publisher", FieldType::many_to_many("publisher")),
            ],
        )
    }

    #[test]
    fn test_equality() {
        let cond = compile_filters(&author_meta(), &Filters::new().with("name", "Ana"), false).unwrap();
        let (sql, params) = cond.to_sql();
        assert_eq!(sql, "name=$1");
        assert_eq!(params, vec![Value::from("Ana")]);
    }

    #[test]
    fn test_operators_in_insertion_order() {
        let filters = Filters::new()
            .with("age__gt", 18)
            .with("age__lte", 65)
            .with("name__lt", "M");
        let cond = compile_filters(&author_meta(), &filters, false).unwrap();
        let (sql, params) = cond.to_sql();
        assert_eq!(sql, "age>$1 AND age<=$2 AND name<$3");
        assert_eq!(params, vec![Value::Int(18), Value::Int(65), Value::from("M")]);
    }

    #[test]
    fn test_gte_operator() {
        let cond = compile_filters(&author_meta(), &Filters::new().with("age__gte", 21), false).unwrap();
        assert_eq!(cond.to_sql().0, "age>=$1");
    }

    #[test]
    fn test_range_tuple() {
        let cond = compile_filters(&author_meta(), &Filters::new().range("age", 18, 30), false).unwrap();
        let (sql, params) = cond.to_sql();
        assert_eq!(sql, "(age>$1 AND age<$2)");
        assert_eq!(params, vec![Value::Int(18), Value::Int(30)]);
    }

    #[test]
    fn test_exclude_negates_each_fragment() {
        let filters = Filters::new().with("name", "Ana").range("age", 18, 30);
        let cond = compile_filters(&author_meta(), &filters, true).unwrap();
        let (parts, params) = cond.fragment_sql();
        assert_eq!(parts, vec!["NOT name=$1", "NOT (age>$2 AND age<$3)"]);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_column_override_used() {
        let cond = compile_filters(&author_meta(), &Filters::new().with("na", 4), false).unwrap();
        assert_eq!(cond.to_sql().0, "uid=$1");
        let cond = compile_filters(&author_meta(), &Filters::new().with("uid", 4), false).unwrap();
        assert_eq!(cond.to_sql().0, "uid=$1");
    }

    #[test]
    fn test_values_are_sanitized() {
        let cond = compile_filters(&author_meta(), &Filters::new().with("age", "42"), false).unwrap();
        assert_eq!(cond.to_sql().1, vec![Value::Int(42)]);
        let err = compile_filters(&author_meta(), &Filters::new().with("age", "old"), false).unwrap_err();
        assert!(matches!(err, OrmError::FieldError(_)));
    }

    #[test]
    fn test_unknown_operator() {
        let err = compile_filters(&author_meta(), &Filters::new().with("age__ne", 1), false).unwrap_err();
        assert!(matches!(err, OrmError::LookupError(_)));
    }

    #[test]
    fn test_unknown_field() {
        let err = compile_filters(&author_meta(), &Filters::new().with("height", 1), false).unwrap_err();
        assert!(matches!(err, OrmError::LookupError(_)));
        assert!(err.to_string().contains("height"));
    }

    #[test]
    fn test_many_to_many_not_filterable() {
        let err = compile_filters(&author_meta(), &Filters::new().with("publisher", 1), false).unwrap_err();
        assert!(matches!(err, OrmError::LookupError(_)));
    }

    #[test]
    fn test_bad_tuple_length() {
        let filters = Filters::new().tuple("age", vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let err = compile_filters(&author_meta(), &filters, false).unwrap_err();
        assert!(matches!(err, OrmError::QuerysetError(_)));
    }

    #[test]
    fn test_tuple_with_operator() {
        let filters = Filters::new().tuple("age__gt", vec![Value::Int(1), Value::Int(2)]);
        let err = compile_filters(&author_meta(), &filters, false).unwrap_err();
        assert!(matches!(err, OrmError::QuerysetError(_)));
    }

    #[test]
    fn test_render_inline() {
        let filters = Filters::new().with("name", "O'Hara").with("age__gt", 3);
        let cond = compile_filters(&author_meta(), &filters, true).unwrap();
        assert_eq!(cond.render_inline(), "NOT name='O''Hara' AND NOT age>3");
        assert_eq!(cond.to_string(), cond.render_inline());
    }

    #[test]
    fn test_qualified_render_continues_numbering() {
        let cond = Condition::equals("author", Value::Int(9));
        let mut params = vec![Value::Int(1)];
        assert_eq!(cond.render(Some("j"), &mut params), "j.author=$2");
    }

    #[test]
    fn test_empty_filters() {
        let cond = compile_filters(&author_meta(), &Filters::new(), false).unwrap();
        assert!(cond.is_empty());
        assert_eq!(cond.to_sql().0, "");
    }
}
