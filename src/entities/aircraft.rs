//! Aircraft records

use crate::core::error::ConfigError;
use crate::core::field::FieldValue;
use crate::core::filter::{FilterDefinition, FilterRegistry, Predicate, ValueType};
use crate::core::query::SortKey;
use crate::core::tenant::TenantId;
use crate::impl_record;
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl_record!(
    Aircraft,
    "aircraft",
    "aircraft",
    {
        designation: String,
        aircraft_type: String,
        date_added: Option<DateTime<Utc>>,
        default_assessment: Option<Uuid>,
    }
);

/// Type given to aircraft registered without one
pub const UNDEFINED_TYPE: &str = "Undefined Type";

impl Aircraft {
    /// Register an aircraft, normalizing its designation
    pub fn register(
        tenant_id: TenantId,
        designation: &str,
        aircraft_type: Option<&str>,
    ) -> Self {
        Self::new(
            tenant_id,
            normalize_designation(designation),
            aircraft_type.unwrap_or(UNDEFINED_TYPE).to_string(),
            Some(Utc::now()),
            None,
        )
    }
}

/// Designations are stored trimmed and upper-cased
pub fn normalize_designation(designation: &str) -> String {
    designation.trim().to_uppercase()
}

/// Filters, sort fields and tags callers may use on aircraft
pub fn aircraft_filters() -> Result<FilterRegistry, ConfigError> {
    FilterRegistry::builder("aircraft")
        .filter(
            FilterDefinition::custom("designation", ValueType::String, |values| {
                let normalized = values
                    .iter()
                    .filter_map(FieldValue::as_string)
                    .map(|d| FieldValue::String(normalize_designation(d)))
                    .collect();
                Predicate::one_of("designation", normalized)
            })
            .multiple(),
        )
        .filter(FilterDefinition::equals("type", "aircraft_type", ValueType::String).multiple())
        .filter(FilterDefinition::equals(
            "defaultAssessment",
            "default_assessment",
            ValueType::IdReference,
        ))
        .filter(FilterDefinition::at_least("addedFrom", "date_added", ValueType::Date))
        .filter(FilterDefinition::at_most("addedTo", "date_added", ValueType::Date))
        .sortable("designation")
        .sortable("created_at")
        .normalized_tag("designation", "designation", normalize_designation)
        .default_sort(vec![SortKey::asc("designation")])
        .build()
}
