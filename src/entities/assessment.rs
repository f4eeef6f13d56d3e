//! Risk assessment templates
//!
//! Assessments are never removed from the store. Deleting one marks it
//! `deleted`, which hides it from lists and lookups, and hands the default
//! flag to another assessment of the account.

use crate::core::error::{ConfigError, EngineResult, RequestError};
use crate::core::filter::{FilterDefinition, FilterRegistry, Predicate, ValueType};
use crate::core::query::{ListQuery, SortKey};
use crate::core::record::Record;
use crate::core::repository::Repository;
use crate::core::store::RecordStore;
use crate::core::tenant::TenantId;
use crate::impl_record;

impl_record!(
    Assessment,
    "assessment",
    "assessments",
    {
        name: String,
        description: Option<String>,
        /// The assessment new flights use when none is chosen
        is_default: bool,
        /// Every user of the account may use it
        allow_all: bool,
        #[serde(default)]
        deleted: bool,
    }
);

impl Assessment {
    /// A visible, non-default assessment open to every user
    pub fn named(tenant_id: TenantId, name: impl Into<String>) -> Self {
        Self::new(tenant_id, name.into(), None, false, true, false)
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// Filters and sort fields callers may use on assessments
///
/// Soft-deleted assessments are excluded from every list and lookup.
pub fn assessment_filters() -> Result<FilterRegistry, ConfigError> {
    FilterRegistry::builder("assessment")
        .filter(FilterDefinition::equals("name", "name", ValueType::String).multiple())
        .filter(FilterDefinition::equals("isDefault", "is_default", ValueType::Boolean))
        .filter(FilterDefinition::equals("allowAll", "allow_all", ValueType::Boolean))
        .sortable("created_at")
        .default_sort(vec![SortKey::asc("name")])
        .base_filter(Predicate::eq("deleted", false))
        .build()
}

/// Soft-delete the assessment a token resolves to
///
/// Refuses to retire the account's last visible assessment. When the retired
/// assessment was the default, the oldest remaining one takes over.
#[tracing::instrument(name = "retire_assessment", skip(repository, tenant_id), fields(tenant = %tenant_id))]
pub async fn retire_assessment<S>(
    repository: &Repository<Assessment, S>,
    token: &str,
    tenant_id: &TenantId,
) -> EngineResult<Option<Assessment>>
where
    S: RecordStore<Assessment>,
{
    let Some(mut retired) = repository.resolve_one(token, tenant_id).await? else {
        return Ok(None);
    };

    let oldest_first = ListQuery::new(*tenant_id, &repository.settings().pagination)
        .with_sort(vec![SortKey::asc("created_at")]);
    let visible = repository.find_with_params(&oldest_first).await?.meta.total_count;
    if visible < 2 {
        return Err(RequestError::LastRemaining {
            entity_type: Assessment::resource_name_singular().to_string(),
        }
        .into());
    }

    let was_default = retired.is_default;
    retired.deleted = true;
    retired.is_default = false;
    repository.replace_one(&retired).await?;
    tracing::info!(id = %retired.id, "retired assessment");

    if was_default {
        // the retired assessment is hidden now, so the first visible one takes over
        let successor = repository.find_with_params(&oldest_first).await?.data.into_iter().next();
        if let Some(mut successor) = successor {
            successor.is_default = true;
            repository.replace_one(&successor).await?;
            tracing::info!(id = %successor.id, "moved default assessment");
        }
    }

    Ok(Some(retired))
}
