//! The record store seam and the tenant-scoped filter it accepts

use crate::core::error::StorageError;
use crate::core::filter::predicate::Predicate;
use crate::core::query::SortKey;
use crate::core::record::Record;
use crate::core::tenant::TenantId;
use async_trait::async_trait;

/// Store field holding the owning tenant
pub const TENANT_FIELD: &str = "tenant_id";

/// A predicate bound to one tenant
///
/// The only filter a [`RecordStore`] accepts. It can only be created inside the
/// crate, so every store query carries the tenant clause.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedFilter {
    tenant_id: TenantId,
    predicate: Predicate,
}

impl ScopedFilter {
    pub(crate) fn new(tenant_id: TenantId, predicate: Predicate) -> Self {
        Self {
            tenant_id,
            predicate,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// The caller's predicate, without the tenant clause
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Whether the filter can match anything at all
    pub fn is_never(&self) -> bool {
        self.predicate.is_never()
    }

    /// The full predicate, tenant clause first
    pub fn to_predicate(&self) -> Predicate {
        Predicate::and([
            Predicate::eq(TENANT_FIELD, self.tenant_id.as_uuid()),
            self.predicate.clone(),
        ])
    }

    /// Evaluate against a record, tenant first
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        record.tenant_id() == self.tenant_id && self.predicate.matches(record)
    }
}

/// Storage backend for one record type
///
/// Implementations translate the scoped filter into their own query language.
/// Errors are reported as [`StorageError`] and never retried by the engine.
#[async_trait]
pub trait RecordStore<T: Record>: Send + Sync {
    /// Name used in logs and storage errors
    fn backend_name(&self) -> &'static str {
        "store"
    }

    /// Count records matching the filter
    async fn count(&self, filter: &ScopedFilter) -> Result<u64, StorageError>;

    /// Fetch one sorted window of matching records
    async fn find(
        &self,
        filter: &ScopedFilter,
        sort: &[SortKey],
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>, StorageError>;

    /// Fetch the first matching record
    async fn find_one(&self, filter: &ScopedFilter) -> Result<Option<T>, StorageError>;

    /// Delete the first matching record and return it
    async fn delete_one(&self, filter: &ScopedFilter) -> Result<Option<T>, StorageError>;

    /// Overwrite the first matching record with `record`
    ///
    /// Returns whether a record matched. Never inserts.
    async fn replace_one(&self, filter: &ScopedFilter, record: &T) -> Result<bool, StorageError>;
}
