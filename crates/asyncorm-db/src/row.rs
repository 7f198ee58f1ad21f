//! Result rows returned by the driver.
//!
//! A [`Row`] keeps `(column, value)` cells in the order the backend returned
//! them. Typed access goes through [`FromValue`].

use asyncorm_core::OrmError;

use crate::value::Value;

/// One result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    /// Pairs column names with their values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "row has {} columns but {} values",
            columns.len(),
            values.len()
        );
        Self {
            cells: columns.into_iter().zip(values).collect(),
        }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` for a row without columns.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates over `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(column, value)| (column.as_str(), value))
    }

    /// Reads the named column as `T`.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T, OrmError> {
        self.get_value(column)
            .ok_or_else(|| OrmError::DatabaseError(format!("Column '{column}' not found in row")))
            .and_then(T::from_value)
    }

    /// Reads the column at `idx` as `T`. Used for single-column results such
    /// as `COUNT(*)`.
    pub fn get_by_index<T: FromValue>(&self, idx: usize) -> Result<T, OrmError> {
        let (_, value) = self.cells.get(idx).ok_or_else(|| {
            OrmError::DatabaseError(format!(
                "Column index {idx} out of bounds (row has {} columns)",
                self.cells.len()
            ))
        })?;
        T::from_value(value)
    }

    /// The raw value of the named column, if present.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.iter()
            .find_map(|(name, value)| (name == column).then_some(value))
    }
}

/// Conversion from a row cell into a Rust type.
pub trait FromValue: Sized {
    /// Converts `value`, failing with [`OrmError::DatabaseError`] on a type
    /// mismatch.
    fn from_value(value: &Value) -> Result<Self, OrmError>;
}

fn mismatch(expected: &str, value: &Value) -> OrmError {
    OrmError::DatabaseError(format!("Expected {expected}, got {value:?}"))
}

macro_rules! from_value {
    ($($target:ty : $expected:literal { $($pattern:pat => $out:expr),+ $(,)? })*) => {
        $(
            impl FromValue for $target {
                fn from_value(value: &Value) -> Result<Self, OrmError> {
                    match value {
                        $($pattern => Ok($out),)+
                        _ => Err(mismatch($expected, value)),
                    }
                }
            }
        )*
    };
}

from_value! {
    i64: "Int" { Value::Int(i) => *i }
    bool: "Bool" { Value::Bool(b) => *b }
    String: "String" { Value::String(s) => s.clone() }
    uuid::Uuid: "Uuid" { Value::Uuid(u) => *u }
    chrono::NaiveDate: "Date" {
        Value::Date(d) => *d,
        Value::DateTime(ts) => ts.date(),
    }
    chrono::NaiveDateTime: "DateTime" {
        Value::DateTime(ts) => *ts,
        Value::DateTimeTz(ts) => ts.naive_utc(),
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, OrmError> {
        let wide = i64::from_value(value)?;
        Self::try_from(wide)
            .map_err(|_| OrmError::DatabaseError(format!("{wide} does not fit in a 32-bit integer")))
    }
}

impl FromValue for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: &Value) -> Result<Self, OrmError> {
        match value {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as Self),
            _ => Err(mismatch("Float", value)),
        }
    }
}

/// JSON columns may come back as text when the query casts them.
impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self, OrmError> {
        match value {
            Value::Json(doc) => Ok(doc.clone()),
            Value::String(text) => Ok(serde_json::from_str(text)?),
            _ => Err(mismatch("Json", value)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, OrmError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, OrmError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

/// Many-to-many ids: `Null` is no ids and a scalar is a single id.
impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, OrmError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::List(items) => items.iter().map(T::from_value).collect(),
            scalar => T::from_value(scalar).map(|one| vec![one]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_row() -> Row {
        Row::new(
            vec!["id".into(), "name".into(), "author".into()],
            vec![Value::Int(3), Value::from("Dune"), Value::Null],
        )
    }

    #[test]
    fn typed_reads_by_name() {
        let row = book_row();
        assert_eq!(row.get::<i64>("id").unwrap(), 3);
        assert_eq!(row.get::<String>("name").unwrap(), "Dune");
        assert_eq!(row.get::<Option<i64>>("author").unwrap(), None);
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn missing_column_is_named_in_error() {
        let err = book_row().get::<i64>("pages").unwrap_err();
        assert!(err.to_string().contains("pages"));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = book_row().get::<bool>("name").unwrap_err();
        assert!(err.to_string().contains("Expected Bool"));
    }

    #[test]
    fn count_rows_read_by_index() {
        let row = Row::new(vec!["count".into()], vec![Value::Int(12)]);
        assert_eq!(row.get_by_index::<i64>(0).unwrap(), 12);
        assert!(row.get_by_index::<Value>(1).is_err());
    }

    #[test]
    fn iteration_keeps_backend_order() {
        let row = book_row();
        let cols: Vec<&str> = row.iter().map(|(c, _)| c).collect();
        assert_eq!(cols, ["id", "name", "author"]);
    }

    #[test]
    fn narrow_and_float_conversions() {
        assert_eq!(i32::from_value(&Value::Int(12)).unwrap(), 12);
        assert!(i32::from_value(&Value::Int(i64::MAX)).is_err());
        assert!((f64::from_value(&Value::Int(2)).unwrap() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn m2m_id_shapes() {
        assert_eq!(Vec::<i64>::from_value(&Value::Int(4)).unwrap(), vec![4]);
        assert_eq!(
            Vec::<i64>::from_value(&Value::List(vec![Value::Int(1), Value::Int(2)])).unwrap(),
            vec![1, 2]
        );
        assert!(Vec::<i64>::from_value(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn timestamps_narrow_to_dates() {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(
            chrono::NaiveDate::from_value(&Value::DateTime(ts)).unwrap(),
            ts.date()
        );
    }

    #[test]
    fn json_from_text() {
        let doc = serde_json::Value::from_value(&Value::from(r#"{"k": 1}"#)).unwrap();
        assert_eq!(doc["k"], 1);
    }

    #[test]
    #[should_panic(expected = "row has 1 columns but 0 values")]
    fn mismatched_lengths_panic() {
        let _ = Row::new(vec!["a".into()], vec![]);
    }
}
