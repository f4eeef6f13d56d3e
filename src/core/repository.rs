//! Tenant-scoped repository facade over a record store

use crate::core::error::{EngineResult, StorageError};
use crate::core::filter::compiler::DynamicFilterParser;
use crate::core::filter::registry::FilterRegistry;
use crate::core::filter::predicate::Predicate;
use crate::core::identifier::{ID_FIELD, IdentifierResolver, Lookup};
use crate::core::query::{ListQuery, Page, PaginationConfig, PaginationMeta};
use crate::core::record::Record;
use crate::core::store::{RecordStore, ScopedFilter};
use crate::core::tenant::TenantId;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Runtime knobs of a repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineSettings {
    /// Page size bounds applied when parsing request parameters
    pub pagination: PaginationConfig,

    /// Upper bound for one store round-trip; `None` waits forever
    pub query_timeout: Option<Duration>,
}

/// Outcome of [`Repository::delete_each`]
#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Records deleted, in token order
    pub succeeded: Vec<T>,

    /// Tokens that matched nothing in the tenant
    pub not_found: Vec<String>,

    /// The token whose store call failed, which stopped the batch
    pub failed: Option<(String, StorageError)>,

    /// Tokens never attempted because the batch stopped
    pub skipped: Vec<String>,
}

impl<T> BatchOutcome<T> {
    fn empty() -> Self {
        Self {
            succeeded: Vec::new(),
            not_found: Vec::new(),
            failed: None,
            skipped: Vec::new(),
        }
    }

    /// Whether every token was processed without a store failure
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

/// Entry point for listing, resolving and deleting records of one type
///
/// Every operation takes the tenant explicitly and wraps the compiled
/// predicate in a [`ScopedFilter`] before the store sees it. Validation
/// failures are returned before any store call.
///
/// # Example
/// ```rust,ignore
/// let repository = Repository::new(Arc::new(store), Arc::new(flight_filters()?));
/// let query = ListQuery::parse(params, tenant_id, &PaginationConfig::default())?;
/// let page = repository.find_with_params(&query).await?;
/// ```
pub struct Repository<T, S> {
    store: Arc<S>,
    registry: Arc<FilterRegistry>,
    settings: EngineSettings,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S> Clone for Repository<T, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            registry: self.registry.clone(),
            settings: self.settings,
            _marker: PhantomData,
        }
    }
}

impl<T: Record, S: RecordStore<T>> Repository<T, S> {
    pub fn new(store: Arc<S>, registry: Arc<FilterRegistry>) -> Self {
        Self {
            store,
            registry,
            settings: EngineSettings::default(),
            _marker: PhantomData,
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// List one page of records matching the query's filters
    ///
    /// Count and page fetch run concurrently over the same scoped filter and
    /// must both succeed.
    #[tracing::instrument(
        name = "find_with_params",
        skip(self, query),
        fields(entity = T::resource_name(), tenant = %query.tenant_id())
    )]
    pub async fn find_with_params(&self, query: &ListQuery) -> EngineResult<Page<T>> {
        let compiled = DynamicFilterParser::new(&self.registry).compile(query)?;
        let filter = ScopedFilter::new(query.tenant_id(), compiled.predicate);

        let (total_count, data) = if filter.is_never() {
            tracing::debug!("filter matches nothing, skipping store");
            (0, Vec::new())
        } else {
            let sort = compiled.sort;
            self.bounded(async {
                futures::try_join!(
                    self.store.count(&filter),
                    self.store
                        .find(&filter, &sort, query.skip(), query.page_size()),
                )
            })
            .await?
        };

        tracing::debug!(total_count, returned = data.len(), "listed records");

        Ok(Page {
            data,
            meta: PaginationMeta::new(query.page(), query.page_size(), total_count),
        })
    }

    /// Resolve a path token (id or tag) to at most one record of the tenant
    #[tracing::instrument(
        name = "resolve_one",
        skip(self, tenant_id),
        fields(entity = T::resource_name(), tenant = %tenant_id)
    )]
    pub async fn resolve_one(&self, token: &str, tenant_id: &TenantId) -> EngineResult<Option<T>> {
        let lookup = self.lookup(token)?;
        let filter = self.lookup_filter(&lookup, tenant_id);

        let record = self.bounded(self.store.find_one(&filter)).await?;
        tracing::debug!(%lookup, found = record.is_some(), "resolved identifier");
        Ok(record)
    }

    /// Delete the record a token resolves to, returning it
    #[tracing::instrument(
        name = "delete_one",
        skip(self, tenant_id),
        fields(entity = T::resource_name(), tenant = %tenant_id)
    )]
    pub async fn delete_one(&self, token: &str, tenant_id: &TenantId) -> EngineResult<Option<T>> {
        let lookup = self.lookup(token)?;
        Ok(self.delete_lookup(&lookup, tenant_id).await?)
    }

    /// Delete several records one at a time
    ///
    /// All tokens are validated first; nothing is deleted when one of them is
    /// invalid. A store failure stops the batch and is reported with what was
    /// already deleted and what was left untouched.
    #[tracing::instrument(
        name = "delete_each",
        skip(self, tokens, tenant_id),
        fields(entity = T::resource_name(), tenant = %tenant_id, count = tokens.len())
    )]
    pub async fn delete_each<K: AsRef<str>>(
        &self,
        tokens: &[K],
        tenant_id: &TenantId,
    ) -> EngineResult<BatchOutcome<T>> {
        let lookups = tokens
            .iter()
            .map(|token| self.lookup(token.as_ref()))
            .collect::<EngineResult<Vec<Lookup>>>()?;

        let mut outcome = BatchOutcome::empty();
        let mut pending = tokens
            .iter()
            .map(|token| token.as_ref())
            .zip(lookups.iter());

        for (token, lookup) in pending.by_ref() {
            match self.delete_lookup(lookup, tenant_id).await {
                Ok(Some(record)) => outcome.succeeded.push(record),
                Ok(None) => outcome.not_found.push(token.to_string()),
                Err(error) => {
                    outcome.failed = Some((token.to_string(), error));
                    break;
                }
            }
        }

        outcome.skipped = pending.map(|(token, _)| token.to_string()).collect();

        tracing::info!(
            deleted = outcome.succeeded.len(),
            not_found = outcome.not_found.len(),
            skipped = outcome.skipped.len(),
            "batch delete finished"
        );

        Ok(outcome)
    }

    /// Overwrite a stored record of the same tenant and id
    ///
    /// Returns whether the record existed. Hidden records can be replaced.
    #[tracing::instrument(
        name = "replace_one",
        skip(self, record),
        fields(entity = T::resource_name(), tenant = %record.tenant_id(), id = %record.id())
    )]
    pub async fn replace_one(&self, record: &T) -> EngineResult<bool> {
        let filter = ScopedFilter::new(record.tenant_id(), Predicate::eq(ID_FIELD, record.id()));
        let replaced = self.bounded(self.store.replace_one(&filter, record)).await?;
        tracing::debug!(replaced, "replaced record");
        Ok(replaced)
    }

    fn lookup(&self, token: &str) -> EngineResult<Lookup> {
        Ok(IdentifierResolver::new(&self.registry).resolve(token)?)
    }

    fn lookup_filter(&self, lookup: &Lookup, tenant_id: &TenantId) -> ScopedFilter {
        ScopedFilter::new(*tenant_id, self.registry.visible(lookup.predicate()))
    }

    async fn delete_lookup(
        &self,
        lookup: &Lookup,
        tenant_id: &TenantId,
    ) -> Result<Option<T>, StorageError> {
        let filter = self.lookup_filter(lookup, tenant_id);
        let deleted = self.bounded(self.store.delete_one(&filter)).await?;

        if let Some(record) = &deleted {
            tracing::info!(id = %record.id(), %lookup, "deleted record");
        }
        Ok(deleted)
    }

    /// Apply the configured timeout to one store round-trip
    async fn bounded<R, F>(&self, operation: F) -> Result<R, StorageError>
    where
        F: Future<Output = Result<R, StorageError>>,
    {
        let result = match self.settings.query_timeout {
            Some(limit) => match tokio::time::timeout(limit, operation).await {
                Ok(result) => result,
                Err(_) => Err(StorageError::Timeout {
                    backend: self.store.backend_name().to_string(),
                    millis: limit.as_millis() as u64,
                }),
            },
            None => operation.await,
        };

        if let Err(error) = &result {
            tracing::error!(%error, "store operation failed");
        }
        result
    }
}
