//! Flight records

use crate::core::error::ConfigError;
use crate::core::filter::{FilterDefinition, FilterRegistry, ValueType};
use crate::impl_record;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

impl_record!(
    Flight,
    "flight",
    "flights",
    {
        aircraft_id: Uuid,
        flight_date: DateTime<Utc>,
        departure_airport: Option<String>,
        arrival_airport: Option<String>,
        pic_id: Uuid,
        sic_id: Option<Uuid>,
        responsible_pilot_id: Uuid,
        assessment_id: Option<Uuid>,
        custom_identifier: Option<String>,
        score: Option<f64>,
        /// Free-form labels set by integrations, addressable as `tag.<name>`
        #[serde(default)]
        tag: BTreeMap<String, String>,
    }
);

/// Tag names usable in `tag.<name>:<value>` flight identifiers
pub const FLIGHT_TAGS: &[&str] = &["customId", "externalId", "importBatch"];

impl Flight {
    /// Set one tag, replacing any previous value
    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tag.insert(name.into(), value.into());
        self
    }
}

/// Filters, sort fields and tags callers may use on flights
pub fn flight_filters() -> Result<FilterRegistry, ConfigError> {
    let mut builder = FilterRegistry::builder("flight")
        .filter(FilterDefinition::equals("aircraft", "aircraft_id", ValueType::IdReference).multiple())
        .filter(FilterDefinition::equals("pic", "pic_id", ValueType::IdReference).multiple())
        .filter(FilterDefinition::equals("sic", "sic_id", ValueType::IdReference).multiple())
        .filter(
            FilterDefinition::equals(
                "responsiblePilot",
                "responsible_pilot_id",
                ValueType::IdReference,
            )
            .multiple(),
        )
        .filter(FilterDefinition::equals("assessment", "assessment_id", ValueType::IdReference))
        .filter(FilterDefinition::equals("departure", "departure_airport", ValueType::String).multiple())
        .filter(FilterDefinition::equals("arrival", "arrival_airport", ValueType::String).multiple())
        .filter(FilterDefinition::equals(
            "customIdentifier",
            "custom_identifier",
            ValueType::String,
        ))
        .filter(FilterDefinition::at_least("dateFrom", "flight_date", ValueType::Date))
        .filter(FilterDefinition::at_most("dateTo", "flight_date", ValueType::Date))
        .filter(FilterDefinition::at_least("scoreMin", "score", ValueType::Number))
        .filter(FilterDefinition::at_most("scoreMax", "score", ValueType::Number))
        .sortable("created_at");

    for name in FLIGHT_TAGS {
        builder = builder.tag(*name, format!("tag.{}", name));
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldValue;
    use crate::core::record::Record;
    use crate::core::tenant::TenantId;
    use chrono::TimeZone;

    fn flight() -> Flight {
        Flight::new(
            TenantId::from(Uuid::new_v4()),
            Uuid::new_v4(),
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            Some("LFPG".to_string()),
            None,
            Uuid::new_v4(),
            None,
            Uuid::new_v4(),
            None,
            None,
            Some(87.5),
            BTreeMap::new(),
        )
    }

    #[test]
    fn test_nested_tag_access() {
        let flight = flight().with_tag("customId", "LH400_0312");
        assert_eq!(
            flight.field_value("tag.customId"),
            Some(FieldValue::from("LH400_0312"))
        );
        assert_eq!(flight.field_value("tag.externalId"), None);
        assert_eq!(flight.field_value("tag"), None);
    }

    #[test]
    fn test_registry_declares_tags() {
        let registry = flight_filters().unwrap();
        assert_eq!(registry.tag_field("customId"), Some("tag.customId"));
        assert!(registry.is_sortable("flight_date"));
        assert!(registry.is_sortable("score"));
        assert_eq!(Flight::resource_name(), "flights");
    }

    #[test]
    fn test_serializes_tags_as_object() {
        let flight = flight().with_tag("externalId", "X1");
        let json = serde_json::to_value(&flight).unwrap();
        assert_eq!(json["tag"], serde_json::json!({ "externalId": "X1" }));
        assert_eq!(json["score"], serde_json::json!(87.5));
    }
}
