//! Backend-agnostic database values.
//!
//! The [`Value`] enum carries field values, bound statement parameters and
//! row contents between the model layer and the driver. Conversions from
//! standard Rust types are provided, and [`Value::to_sql_literal`] renders a
//! value as a quoted SQL literal for DDL defaults and log output.

use std::fmt;

/// A backend-agnostic representation of a database value.
///
/// # Examples
///
/// ```
/// use asyncorm_db::value::Value;
///
/// let v = Value::from(42_i64);
/// assert_eq!(v, Value::Int(42));
///
/// let v = Value::from("hello");
/// assert_eq!(v, Value::String("hello".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// SQL NULL.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// Raw binary data.
    Bytes(Vec<u8>),
    /// A date without time.
    Date(chrono::NaiveDate),
    /// A date and time without timezone.
    DateTime(chrono::NaiveDateTime),
    /// A date and time with UTC timezone.
    DateTimeTz(chrono::DateTime<chrono::Utc>),
    /// A time without date.
    Time(chrono::NaiveTime),
    /// A UUID value.
    Uuid(uuid::Uuid),
    /// A JSON value.
    Json(serde_json::Value),
    /// A list of values (many-to-many ids, array columns).
    List(Vec<Value>),
}


impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => b.fmt(f),
            Self::Int(i) => i.fmt(f),
            Self::Float(x) => x.fmt(f),
            Self::String(s) => f.write_str(s),
            Self::Bytes(raw) => write!(f, "<{} bytes>", raw.len()),
            Self::Date(d) => d.fmt(f),
            Self::DateTime(ts) => ts.fmt(f),
            Self::DateTimeTz(ts) => ts.fmt(f),
            Self::Time(t) => t.fmt(f),
            Self::Uuid(id) => id.fmt(f),
            Self::Json(doc) => doc.fmt(f),
            Self::List(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

macro_rules! value_from {
    (@conv $raw:ident) => { $raw };
    (@conv $raw:ident, $widen:path) => { $widen($raw) };
    ($($source:ty => $variant:ident $(via $widen:path)?),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(raw: $source) -> Self {
                    Self::$variant(value_from!(@conv raw $(, $widen)?))
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i16 => Int via i64::from,
    i32 => Int via i64::from,
    i64 => Int,
    f32 => Float via f64::from,
    f64 => Float,
    String => String,
    Vec<u8> => Bytes,
    chrono::NaiveDate => Date,
    chrono::NaiveDateTime => DateTime,
    chrono::DateTime<chrono::Utc> => DateTimeTz,
    chrono::NaiveTime => Time,
    uuid::Uuid => Uuid,
    serde_json::Value => Json,
    Vec<Value> => List,
}

impl From<&str> for Value {
    fn from(raw: &str) -> Self {
        Self::String(raw.to_owned())
    }
}

/// `None` maps to SQL NULL, which is how nullable model fields are written.
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(raw: Option<T>) -> Self {
        raw.map_or(Self::Null, Into::into)
    }
}

impl Value {
    /// Returns `true` if this value is `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The integer payload, used for primary keys and counts.
    pub const fn as_int(&self) -> Option<i64> {
        if let Self::Int(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// The text payload, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    /// Returns `true` for `Null` and for an empty list, the two shapes an
    /// unset many-to-many value takes.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Renders this value as a PostgreSQL literal.
    ///
    /// Strings are single-quoted with embedded quotes doubled. Only used for
    /// column defaults in DDL and for debug rendering of conditions; statement
    /// parameters are always bound.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_owned(),
            Self::Bool(true) => "TRUE".to_owned(),
            Self::Bool(false) => "FALSE".to_owned(),
            Self::Int(i) => i.to_string(),
            Self::Float(x) => x.to_string(),
            Self::String(s) => quote(s),
            Self::Bytes(raw) => {
                let hex: String = raw.iter().map(|byte| format!("{byte:02x}")).collect();
                format!("'\\x{hex}'::bytea")
            }
            Self::Date(d) => quote(&d.format("%Y-%m-%d").to_string()),
            Self::DateTime(ts) => quote(&ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Self::DateTimeTz(ts) => quote(&ts.to_rfc3339()),
            Self::Time(t) => quote(&t.format("%H:%M:%S%.f").to_string()),
            Self::Uuid(id) => quote(&id.to_string()),
            Self::Json(doc) => format!("{}::jsonb", quote(&doc.to_string())),
            Self::List(items) => {
                let rendered: Vec<String> = items.iter().map(Self::to_sql_literal).collect();
                format!("ARRAY[{}]", rendered.join(", "))
            }
        }
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
