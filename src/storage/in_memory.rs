//! In-memory record store for testing and development

use crate::core::error::StorageError;
use crate::core::field::FieldValue;
use crate::core::query::{SortDirection, SortKey};
use crate::core::record::Record;
use crate::core::store::{RecordStore, ScopedFilter};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

const BACKEND: &str = "in-memory";

/// In-memory record store
///
/// Useful for testing and development. Uses RwLock for thread-safe access and
/// evaluates scoped filters with the same comparison rules as a document
/// store.
#[derive(Clone)]
pub struct InMemoryStore<T> {
    records: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Record> InMemoryStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a store seeded with records
    pub fn with_records(records: impl IntoIterator<Item = T>) -> Self {
        let records = records.into_iter().map(|r| (r.id(), r)).collect();
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Insert or replace a record
    pub fn insert(&self, record: T) -> Result<(), StorageError> {
        let mut records = self.records.write().map_err(|e| lock_error("write", e))?;
        records.insert(record.id(), record);
        Ok(())
    }

    /// Number of stored records across all tenants
    pub fn len(&self) -> Result<usize, StorageError> {
        let records = self.records.read().map_err(|e| lock_error("read", e))?;
        Ok(records.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// Matching records, oldest first, so single-record operations are stable
    fn matching(&self, filter: &ScopedFilter) -> Result<Vec<T>, StorageError> {
        let records = self.records.read().map_err(|e| lock_error("read", e))?;

        let mut matched: Vec<T> = records
            .values()
            .filter(|record| filter.matches(*record))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(matched)
    }
}

impl<T: Record> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error(kind: &str, error: impl std::fmt::Display) -> StorageError {
    StorageError::Unavailable {
        backend: BACKEND.to_string(),
        message: format!("Failed to acquire {} lock: {}", kind, error),
    }
}

/// Compare two records on the sort keys
///
/// Missing and null values sort last whatever the direction.
fn compare_records<T: Record>(a: &T, b: &T, sort: &[SortKey]) -> Ordering {
    for key in sort {
        let left = present(a.field_value(&key.field));
        let right = present(b.field_value(&key.field));

        let ordering = match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(left), Some(right)) => match key.direction {
                SortDirection::Ascending => left.sort_cmp(&right),
                SortDirection::Descending => right.sort_cmp(&left),
            },
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn present(value: Option<FieldValue>) -> Option<FieldValue> {
    value.filter(|v| !v.is_null())
}

#[async_trait]
impl<T: Record> RecordStore<T> for InMemoryStore<T> {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn count(&self, filter: &ScopedFilter) -> Result<u64, StorageError> {
        let records = self.records.read().map_err(|e| lock_error("read", e))?;
        Ok(records.values().filter(|r| filter.matches(*r)).count() as u64)
    }

    async fn find(
        &self,
        filter: &ScopedFilter,
        sort: &[SortKey],
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>, StorageError> {
        let mut matched = self.matching(filter)?;
        matched.sort_by(|a, b| compare_records(a, b, sort));

        Ok(matched
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn find_one(&self, filter: &ScopedFilter) -> Result<Option<T>, StorageError> {
        Ok(self.matching(filter)?.into_iter().next())
    }

    async fn delete_one(&self, filter: &ScopedFilter) -> Result<Option<T>, StorageError> {
        let Some(target) = self.matching(filter)?.into_iter().next() else {
            return Ok(None);
        };

        let mut records = self.records.write().map_err(|e| lock_error("write", e))?;
        Ok(records.remove(&target.id()))
    }

    async fn replace_one(&self, filter: &ScopedFilter, record: &T) -> Result<bool, StorageError> {
        let Some(target) = self.matching(filter)?.into_iter().next() else {
            return Ok(false);
        };

        let mut records = self.records.write().map_err(|e| lock_error("write", e))?;
        records.remove(&target.id());
        records.insert(record.id(), record.clone());
        Ok(true)
    }
}
