//! Conversion of application values into bound statement parameters.
//!
//! [`FieldDef::sanitize`] coerces a [`Value`] to the representation the
//! column expects and rejects values that break the field's rules (choices,
//! max length, email format). [`FieldDef::value_for_save`] additionally
//! applies defaults and `auto_now` before sanitizing.

use std::sync::LazyLock;

use asyncorm_core::{OrmError, OrmResult};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use super::types::{FieldDef, FieldType};
use crate::value::Value;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

impl FieldDef {
    /// Converts `value` into the parameter bound for this field.
    ///
    /// `Null` passes through unchanged. Many-to-many fields sanitize each
    /// related id (a list stays a list).
    pub fn sanitize(&self, value: Value) -> OrmResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        let value = match &self.field_type {
            FieldType::ManyToMany { .. } => match value {
                Value::List(items) => Value::List(
                    items
                        .into_iter()
                        .map(|item| self.to_integer(item))
                        .collect::<OrmResult<_>>()?,
                ),
                other => self.to_integer(other)?,
            },
            t if t.is_integer() => self.to_integer(value)?,
            FieldType::CharField | FieldType::TextField => self.to_text(value)?,
            FieldType::EmailField => {
                let text = self.to_text(value)?;
                if !text.as_str().is_some_and(|s| EMAIL_RE.is_match(s)) {
                    return Err(self.reject(&format!("'{text}' is not a valid email address")));
                }
                text
            }
            FieldType::FloatField => match value {
                Value::Float(_) => value,
                Value::Int(i) => Value::Float(i as f64),
                Value::String(s) => Value::Float(
                    s.trim()
                        .parse()
                        .map_err(|_| self.reject(&format!("'{s}' is not a number")))?,
                ),
                other => return Err(self.type_mismatch(&other)),
            },
            FieldType::BooleanField => match value {
                Value::Bool(_) => value,
                Value::Int(0) => Value::Bool(false),
                Value::Int(1) => Value::Bool(true),
                Value::String(s) => match s.to_lowercase().as_str() {
                    "true" | "t" | "1" => Value::Bool(true),
                    "false" | "f" | "0" => Value::Bool(false),
                    _ => return Err(self.reject(&format!("'{s}' is not a boolean"))),
                },
                other => return Err(self.type_mismatch(&other)),
            },
            FieldType::DateField => match value {
                Value::Date(_) => value,
                Value::DateTime(dt) => Value::Date(dt.date()),
                Value::DateTimeTz(dt) => Value::Date(dt.date_naive()),
                Value::String(s) => Value::Date(
                    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                        .map_err(|e| self.reject(&format!("'{s}' is not a date: {e}")))?,
                ),
                other => return Err(self.type_mismatch(&other)),
            },
            FieldType::DateTimeField => match value {
                Value::DateTime(_) => value,
                Value::DateTimeTz(dt) => Value::DateTime(dt.naive_utc()),
                Value::Date(d) => Value::DateTime(d.and_time(chrono::NaiveTime::MIN)),
                Value::String(s) => Value::DateTime(parse_datetime(s.trim()).ok_or_else(|| {
                    self.reject(&format!("'{s}' is not a date and time"))
                })?),
                other => return Err(self.type_mismatch(&other)),
            },
            FieldType::JsonField => match value {
                Value::Json(_) => value,
                Value::String(s) => Value::Json(
                    serde_json::from_str(&s)
                        .map_err(|e| self.reject(&format!("invalid JSON: {e}")))?,
                ),
                Value::Int(i) => Value::Json(serde_json::json!(i)),
                Value::Bool(b) => Value::Json(serde_json::json!(b)),
                other => return Err(self.type_mismatch(&other)),
            },
            _ => value,
        };

        self.check_choices(&value)?;
        Ok(value)
    }

    /// Produces the value written by `save`.
    ///
    /// `auto_now` fields always get the current date or timestamp. On insert,
    /// a missing value falls back to the field default.
    pub fn value_for_save(&self, value: Value, inserting: bool) -> OrmResult<Value> {
        let value = if self.auto_now {
            let now = Utc::now().naive_utc();
            match self.field_type {
                FieldType::DateField => Value::Date(now.date()),
                _ => Value::DateTime(now),
            }
        } else if value.is_null() && inserting {
            self.default
                .as_ref()
                .map_or(Value::Null, super::types::FieldDefault::resolve)
        } else {
            value
        };
        self.sanitize(value)
    }

    fn to_integer(&self, value: Value) -> OrmResult<Value> {
        match value {
            Value::Int(_) => Ok(value),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| self.reject(&format!("'{s}' is not an integer"))),
            other => Err(self.type_mismatch(&other)),
        }
    }

    fn to_text(&self, value: Value) -> OrmResult<Value> {
        let text = match value {
            Value::String(s) => s,
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Uuid(u) => u.to_string(),
            other => return Err(self.type_mismatch(&other)),
        };
        if let Some(max) = self.max_length {
            let len = text.chars().count();
            if len > max {
                return Err(self.reject(&format!(
                    "ensure this value has at most {max} characters (it has {len})"
                )));
            }
        }
        Ok(Value::String(text))
    }

    fn check_choices(&self, value: &Value) -> OrmResult<()> {
        match &self.choices {
            Some(choices) if !choices.iter().any(|(choice, _)| choice == value) => {
                Err(self.reject(&format!("{value} is not a valid choice")))
            }
            _ => Ok(()),
        }
    }

    fn type_mismatch(&self, value: &Value) -> OrmError {
        self.reject(&format!("cannot store {value:?} in a {:?}", self.field_type))
    }

    fn reject(&self, reason: &str) -> OrmError {
        OrmError::FieldError(format!("{}: {reason}", self.name))
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}
