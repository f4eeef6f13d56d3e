//! Field values and the comparison rules predicates are evaluated with

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the value as a UUID if possible
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Compare two values the way a document store would
    ///
    /// Integers and floats compare numerically, a UUID compares with a string
    /// through its canonical hyphenated text, and every other pair of
    /// different kinds is incomparable (`None`).
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        use FieldValue::*;

        match (self, other) {
            (String(a), String(b)) => Some(a.cmp(b)),
            (Integer(a), Integer(b)) => Some(a.cmp(b)),
            (Integer(_) | Float(_), Integer(_) | Float(_)) => {
                self.as_float()?.partial_cmp(&other.as_float()?)
            }
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (Uuid(a), Uuid(b)) => Some(a.cmp(b)),
            (Uuid(a), String(b)) => Some(a.hyphenated().to_string().cmp(&b.to_lowercase())),
            (String(a), Uuid(b)) => Some(a.to_lowercase().cmp(&b.hyphenated().to_string())),
            (DateTime(a), DateTime(b)) => Some(a.cmp(b)),
            (Null, Null) => Some(Ordering::Equal),
            _ => None,
        }
    }

    /// Equality under [`compare`](Self::compare)
    pub fn matches(&self, other: &FieldValue) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Total order used for sorting
    ///
    /// Values of the same kind use [`compare`](Self::compare); mixed kinds fall
    /// back to a fixed rank so sorting never panics or flips.
    pub fn sort_cmp(&self, other: &FieldValue) -> Ordering {
        self.compare(other)
            .unwrap_or_else(|| self.kind_rank().cmp(&other.kind_rank()))
    }

    fn kind_rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Integer(_) | FieldValue::Float(_) => 1,
            FieldValue::String(_) | FieldValue::Uuid(_) => 2,
            FieldValue::Boolean(_) => 3,
            FieldValue::DateTime(_) => 4,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_field_value_string() {
        let value = FieldValue::String("test".to_string());
        assert_eq!(value.as_string(), Some("test"));
        assert_eq!(value.as_integer(), None);
        assert!(!value.is_null());
    }

    #[test]
    fn test_numeric_cross_type_comparison() {
        assert_eq!(
            FieldValue::Integer(3).compare(&FieldValue::Float(3.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            FieldValue::Float(2.5).compare(&FieldValue::Integer(3)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_uuid_matches_canonical_string() {
        let id = Uuid::new_v4();
        assert!(FieldValue::Uuid(id).matches(&FieldValue::String(id.to_string())));
        assert!(
            FieldValue::String(id.to_string().to_uppercase()).matches(&FieldValue::Uuid(id))
        );
        assert!(!FieldValue::Uuid(id).matches(&FieldValue::String("not-a-uuid".into())));
    }

    #[test]
    fn test_mixed_kinds_are_incomparable() {
        assert_eq!(FieldValue::Integer(1).compare(&FieldValue::from("1")), None);
        assert!(!FieldValue::Boolean(true).matches(&FieldValue::Integer(1)));
    }

    #[test]
    fn test_sort_cmp_is_total() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut values = vec![
            FieldValue::DateTime(date),
            FieldValue::from("b"),
            FieldValue::Null,
            FieldValue::Integer(5),
            FieldValue::from("a"),
        ];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(
            values,
            vec![
                FieldValue::Null,
                FieldValue::Integer(5),
                FieldValue::from("a"),
                FieldValue::from("b"),
                FieldValue::DateTime(date),
            ]
        );
    }

    #[test]
    fn test_from_option() {
        assert_eq!(FieldValue::from(None::<i64>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(7i64)), FieldValue::Integer(7));
    }

    #[test]
    fn test_serde_untagged() {
        let json = serde_json::to_value(FieldValue::Integer(42)).unwrap();
        assert_eq!(json, serde_json::json!(42));
        let restored: FieldValue = serde_json::from_value(json).unwrap();
        assert_eq!(restored, FieldValue::Integer(42));
    }
}
