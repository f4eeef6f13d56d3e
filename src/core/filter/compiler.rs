//! Compiles untrusted raw filters against an entity registry

use crate::core::error::FilterError;
use crate::core::field::FieldValue;
use crate::core::filter::definition::{FilterDefinition, FilterMode, FilterTarget};
use crate::core::filter::predicate::{CompiledPredicate, Predicate};
use crate::core::filter::registry::FilterRegistry;
use crate::core::query::{ListQuery, SortKey};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field every sort ends with so pages never overlap
pub const TIE_BREAKER_FIELD: &str = "id";

/// Turns raw filters and sort keys into a [`CompiledPredicate`]
///
/// Nothing the registry does not declare gets through: unknown keys, values
/// of the wrong type and unknown sort fields are all rejected.
pub struct DynamicFilterParser<'a> {
    registry: &'a FilterRegistry,
}

impl<'a> DynamicFilterParser<'a> {
    pub fn new(registry: &'a FilterRegistry) -> Self {
        Self { registry }
    }

    /// Compile the filters and sort of a list query
    pub fn compile(&self, query: &ListQuery) -> Result<CompiledPredicate, FilterError> {
        let predicate = self.compile_filters(query.raw_filters())?;
        let sort = self.compile_sort(query.sort())?;

        tracing::debug!(
            entity = self.registry.entity(),
            ?predicate,
            ?sort,
            "compiled list query"
        );

        Ok(CompiledPredicate { predicate, sort })
    }

    /// Compile raw filters into one conjunction
    pub fn compile_filters(
        &self,
        raw_filters: &BTreeMap<String, Value>,
    ) -> Result<Predicate, FilterError> {
        let mut predicates = Vec::with_capacity(raw_filters.len());

        for (key, raw) in raw_filters {
            let Some(definition) = self.registry.get(key) else {
                tracing::warn!(entity = self.registry.entity(), key, "rejected unknown filter");
                return Err(FilterError::UnknownKey { key: key.clone() });
            };
            predicates.push(self.compile_one(definition, raw)?);
        }

        Ok(self.registry.visible(Predicate::and(predicates)))
    }

    fn compile_one(&self, definition: &FilterDefinition, raw: &Value) -> Result<Predicate, FilterError> {
        let bad_value = |message: String| {
            tracing::warn!(
                entity = self.registry.entity(),
                key = %definition.key,
                %message,
                "rejected filter value"
            );
            FilterError::BadValue {
                key: definition.key.clone(),
                message,
            }
        };

        let (values, is_array) = match raw {
            Value::Array(items) => {
                if !definition.allow_multiple {
                    return Err(bad_value("multiple values are not allowed".to_string()));
                }
                let values = items
                    .iter()
                    .map(|item| definition.coerce(item))
                    .collect::<Result<Vec<FieldValue>, _>>()
                    .map_err(|e| bad_value(e.to_string()))?;
                (values, true)
            }
            scalar => {
                let value = definition
                    .coerce(scalar)
                    .map_err(|e| bad_value(e.to_string()))?;
                (vec![value], false)
            }
        };

        if is_array && values.is_empty() {
            return Ok(Predicate::Never);
        }

        let predicate = match &definition.target {
            FilterTarget::Custom(builder) => builder(&values),
            FilterTarget::Field { field, mode } => match (mode, is_array) {
                (FilterMode::Equals, true) => Predicate::one_of(field.clone(), values),
                (mode, _) => {
                    let value = values.into_iter().next().unwrap_or(FieldValue::Null);
                    match mode {
                        FilterMode::Equals => Predicate::eq(field.clone(), value),
                        FilterMode::AtLeast => Predicate::gte(field.clone(), value),
                        FilterMode::AtMost => Predicate::lte(field.clone(), value),
                    }
                }
            },
        };

        Ok(predicate)
    }

    /// Validate sort keys and append the tie-breaker
    ///
    /// An empty sort falls back to the registry default.
    pub fn compile_sort(&self, requested: &[SortKey]) -> Result<Vec<SortKey>, FilterError> {
        let mut sort = if requested.is_empty() {
            self.registry.default_sort().to_vec()
        } else {
            for key in requested {
                if !self.registry.is_sortable(&key.field) {
                    tracing::warn!(
                        entity = self.registry.entity(),
                        field = %key.field,
                        "rejected sort field"
                    );
                    return Err(FilterError::UnknownSortField {
                        field: key.field.clone(),
                    });
                }
            }
            requested.to_vec()
        };

        if !sort.iter().any(|key| key.field == TIE_BREAKER_FIELD) {
            sort.push(SortKey::asc(TIE_BREAKER_FIELD));
        }

        Ok(sort)
    }
}
