//! Declarative filter definitions and value coercion

use crate::core::field::FieldValue;
use crate::core::filter::predicate::Predicate;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Declared type of a filter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    Date,
    /// One of a closed set of strings
    Enum(Vec<String>),
    /// Identifier of another record (UUID)
    IdReference,
}

/// How a field filter compares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Equals,
    AtLeast,
    AtMost,
}

/// Builds a predicate from coerced values
pub type PredicateBuilder = Arc<dyn Fn(&[FieldValue]) -> Predicate + Send + Sync>;

/// What a filter key compiles to
#[derive(Clone)]
pub enum FilterTarget {
    /// Compare one store field
    Field { field: String, mode: FilterMode },

    /// Hand-written predicate for filters that are not a single comparison
    Custom(PredicateBuilder),
}

impl fmt::Debug for FilterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterTarget::Field { field, mode } => f
                .debug_struct("Field")
                .field("field", field)
                .field("mode", mode)
                .finish(),
            FilterTarget::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A public filter key and how it maps onto the store
#[derive(Debug, Clone)]
pub struct FilterDefinition {
    pub key: String,
    pub target: FilterTarget,
    pub value_type: ValueType,
    pub allow_multiple: bool,
}

impl FilterDefinition {
    /// Equality filter on `field`
    pub fn equals(key: impl Into<String>, field: impl Into<String>, value_type: ValueType) -> Self {
        Self::with_mode(key, field, FilterMode::Equals, value_type)
    }

    /// Lower-bound filter (`field >= value`)
    pub fn at_least(
        key: impl Into<String>,
        field: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        Self::with_mode(key, field, FilterMode::AtLeast, value_type)
    }

    /// Upper-bound filter (`field <= value`)
    pub fn at_most(key: impl Into<String>, field: impl Into<String>, value_type: ValueType) -> Self {
        Self::with_mode(key, field, FilterMode::AtMost, value_type)
    }

    pub fn with_mode(
        key: impl Into<String>,
        field: impl Into<String>,
        mode: FilterMode,
        value_type: ValueType,
    ) -> Self {
        Self {
            key: key.into(),
            target: FilterTarget::Field {
                field: field.into(),
                mode,
            },
            value_type,
            allow_multiple: false,
        }
    }

    /// Filter compiled by a custom builder
    pub fn custom<F>(key: impl Into<String>, value_type: ValueType, builder: F) -> Self
    where
        F: Fn(&[FieldValue]) -> Predicate + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            target: FilterTarget::Custom(Arc::new(builder)),
            value_type,
            allow_multiple: false,
        }
    }

    /// Accept arrays of values (compiled to a membership test)
    pub fn multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }

    /// The store field this filter reads, if it is a plain field filter
    pub fn field(&self) -> Option<&str> {
        match &self.target {
            FilterTarget::Field { field, .. } => Some(field),
            FilterTarget::Custom(_) => None,
        }
    }

    /// Coerce one raw scalar to the declared type
    pub fn coerce(&self, raw: &Value) -> Result<FieldValue, CoercionError> {
        let end_of_day = matches!(
            self.target,
            FilterTarget::Field {
                mode: FilterMode::AtMost,
                ..
            }
        );
        coerce_value(&self.value_type, raw, end_of_day)
    }
}

/// Why a raw value does not fit its declared type
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoercionError {
    #[error("expected a {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("'{0}' is not a boolean")]
    NotABoolean(String),

    #[error("'{0}' is not a date (expected RFC 3339 or YYYY-MM-DD)")]
    NotADate(String),

    #[error("'{value}' is not one of {allowed:?}")]
    NotAVariant { value: String, allowed: Vec<String> },

    #[error("'{0}' is not a valid identifier")]
    NotAnId(String),
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_str<'a>(raw: &'a Value, expected: &'static str) -> Result<&'a str, CoercionError> {
    raw.as_str().ok_or(CoercionError::TypeMismatch {
        expected,
        got: kind_of(raw),
    })
}

fn coerce_value(
    value_type: &ValueType,
    raw: &Value,
    end_of_day: bool,
) -> Result<FieldValue, CoercionError> {
    match value_type {
        ValueType::String => match raw {
            Value::String(s) => Ok(FieldValue::String(s.clone())),
            Value::Number(n) => Ok(FieldValue::String(n.to_string())),
            Value::Bool(b) => Ok(FieldValue::String(b.to_string())),
            other => Err(CoercionError::TypeMismatch {
                expected: "string",
                got: kind_of(other),
            }),
        },

        ValueType::Number => match raw {
            Value::Number(n) => number_value(n.as_i64(), n.as_f64(), &n.to_string()),
            Value::String(s) => {
                let trimmed = s.trim();
                number_value(
                    trimmed.parse::<i64>().ok(),
                    trimmed.parse::<f64>().ok(),
                    trimmed,
                )
            }
            other => Err(CoercionError::TypeMismatch {
                expected: "number",
                got: kind_of(other),
            }),
        },

        ValueType::Boolean => match raw {
            Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
            Value::String(s) => match s.trim() {
                "true" | "1" => Ok(FieldValue::Boolean(true)),
                "false" | "0" => Ok(FieldValue::Boolean(false)),
                other => Err(CoercionError::NotABoolean(other.to_string())),
            },
            other => Err(CoercionError::TypeMismatch {
                expected: "boolean",
                got: kind_of(other),
            }),
        },

        ValueType::Date => {
            let s = expect_str(raw, "date")?.trim();
            parse_date(s, end_of_day)
                .map(FieldValue::DateTime)
                .ok_or_else(|| CoercionError::NotADate(s.to_string()))
        }

        ValueType::Enum(variants) => {
            let s = expect_str(raw, "string")?;
            if variants.iter().any(|v| v == s) {
                Ok(FieldValue::String(s.to_string()))
            } else {
                Err(CoercionError::NotAVariant {
                    value: s.to_string(),
                    allowed: variants.clone(),
                })
            }
        }

        ValueType::IdReference => {
            let s = expect_str(raw, "identifier")?.trim();
            Uuid::parse_str(s)
                .map(FieldValue::Uuid)
                .map_err(|_| CoercionError::NotAnId(s.to_string()))
        }
    }
}

fn number_value(
    integer: Option<i64>,
    float: Option<f64>,
    text: &str,
) -> Result<FieldValue, CoercionError> {
    match (integer, float) {
        (Some(i), _) => Ok(FieldValue::Integer(i)),
        (None, Some(f)) if f.is_finite() => Ok(FieldValue::Float(f)),
        _ => Err(CoercionError::NotANumber(text.to_string())),
    }
}

/// A bare date is midnight UTC, or the last millisecond of that day for
/// upper bounds so `dateTo=2024-01-31` includes the 31st.
fn parse_date(s: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(s) {
        return Some(timestamp.with_timezone(&Utc));
    }

    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let midnight = day.and_hms_opt(0, 0, 0)?.and_utc();
    if end_of_day {
        Some(midnight + Duration::days(1) - Duration::milliseconds(1))
    } else {
        Some(midnight)
    }
}
