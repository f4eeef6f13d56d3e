//! The record abstraction every listable entity implements

use crate::core::field::FieldValue;
use crate::core::tenant::TenantId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// A tenant-owned record that can be listed, resolved and deleted.
///
/// Every record carries:
/// - id: Unique identifier
/// - tenant_id: The account the record belongs to
/// - created_at: Creation timestamp (the default sort key)
///
/// Field access is dynamic so predicates can be evaluated without knowing the
/// concrete type. Nested fields use dotted paths (`tag.customId`).
pub trait Record: Clone + Serialize + Send + Sync + 'static {
    /// The plural resource name used in URLs and as collection name
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "flight")
    fn resource_name_singular() -> &'static str;

    /// Get the unique identifier for this record
    fn id(&self) -> Uuid;

    /// Get the tenant owning this record
    fn tenant_id(&self) -> TenantId;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Get the value at a (possibly dotted) field path
    fn field_value(&self, field: &str) -> Option<FieldValue>;
}

/// A value that can be read as a [`FieldValue`] at a sub-path.
///
/// Scalars answer the empty path only; maps descend one segment per key.
pub trait FieldSource {
    fn field_at(&self, path: &str) -> Option<FieldValue>;
}

macro_rules! scalar_field_source {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldSource for $ty {
                fn field_at(&self, path: &str) -> Option<FieldValue> {
                    path.is_empty().then(|| FieldValue::from(self.clone()))
                }
            }
        )*
    };
}

scalar_field_source!(String, i64, f64, bool, Uuid, DateTime<Utc>);

impl FieldSource for TenantId {
    fn field_at(&self, path: &str) -> Option<FieldValue> {
        path.is_empty().then(|| FieldValue::Uuid(self.as_uuid()))
    }
}

impl<T: FieldSource> FieldSource for Option<T> {
    fn field_at(&self, path: &str) -> Option<FieldValue> {
        match self {
            Some(inner) => inner.field_at(path),
            None if path.is_empty() => Some(FieldValue::Null),
            None => None,
        }
    }
}

impl<V: FieldSource> FieldSource for BTreeMap<String, V> {
    fn field_at(&self, path: &str) -> Option<FieldValue> {
        let (head, rest) = split_path(path);
        self.get(head)?.field_at(rest)
    }
}

impl<V: FieldSource> FieldSource for HashMap<String, V> {
    fn field_at(&self, path: &str) -> Option<FieldValue> {
        let (head, rest) = split_path(path);
        self.get(head)?.field_at(rest)
    }
}

/// Split `a.b.c` into `("a", "b.c")`
pub fn split_path(path: &str) -> (&str, &str) {
    path.split_once('.').unwrap_or((path, ""))
}
