//! Per-entity whitelist of filters, sortable fields and tag fields

use crate::core::error::ConfigError;
use crate::core::filter::definition::{FilterDefinition, FilterMode, FilterTarget, ValueType};
use crate::core::filter::predicate::Predicate;
use crate::core::query::SortKey;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Rewrites the value of a `tag.<name>:<value>` identifier before lookup
pub type TagNormalizer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A tag name callers may use in identifiers and the store field behind it
#[derive(Clone)]
pub struct TagDefinition {
    pub field: String,
    pub normalize: Option<TagNormalizer>,
}

impl TagDefinition {
    /// The value looked up for a raw tag value
    pub fn lookup_value(&self, raw: &str) -> String {
        match &self.normalize {
            Some(normalize) => normalize(raw),
            None => raw.to_string(),
        }
    }
}

impl fmt::Debug for TagDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagDefinition")
            .field("field", &self.field)
            .field("normalize", &self.normalize.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Immutable table describing what callers may filter, sort and tag-resolve on
///
/// Built once at startup with [`FilterRegistry::builder`] and shared behind an
/// `Arc` for the rest of the process.
///
/// # Example
/// ```rust,ignore
/// let registry = FilterRegistry::builder("aircraft")
///     .filter(FilterDefinition::equals("type", "aircraft_type", ValueType::String).multiple())
///     .sortable("designation")
///     .tag("designation", "designation")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    entity: String,
    filters: BTreeMap<String, FilterDefinition>,
    sortable: BTreeSet<String>,
    tags: BTreeMap<String, TagDefinition>,
    default_sort: Vec<SortKey>,
    base_filter: Predicate,
}

impl FilterRegistry {
    pub fn builder(entity: impl Into<String>) -> FilterRegistryBuilder {
        FilterRegistryBuilder {
            entity: entity.into(),
            filters: Vec::new(),
            sortable: Vec::new(),
            tags: Vec::new(),
            default_sort: None,
            base_filter: Predicate::Always,
        }
    }

    /// Name of the entity this registry belongs to
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn get(&self, key: &str) -> Option<&FilterDefinition> {
        self.filters.get(key)
    }

    pub fn filters(&self) -> impl Iterator<Item = &FilterDefinition> {
        self.filters.values()
    }

    pub fn is_sortable(&self, field: &str) -> bool {
        self.sortable.contains(field)
    }

    pub fn sortable(&self) -> impl Iterator<Item = &str> {
        self.sortable.iter().map(String::as_str)
    }

    /// Store field addressed by `tag.<name>:<value>`, if `name` is allowed
    pub fn tag_field(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(|tag| tag.field.as_str())
    }

    pub fn tag(&self, name: &str) -> Option<&TagDefinition> {
        self.tags.get(name)
    }

    pub fn default_sort(&self) -> &[SortKey] {
        &self.default_sort
    }

    /// Predicate conjoined with every list filter and identifier lookup
    pub fn base_filter(&self) -> &Predicate {
        &self.base_filter
    }

    /// `predicate` restricted to the records callers may see
    pub fn visible(&self, predicate: Predicate) -> Predicate {
        Predicate::and([self.base_filter.clone(), predicate])
    }
}

/// Builder for [`FilterRegistry`]
pub struct FilterRegistryBuilder {
    entity: String,
    filters: Vec<FilterDefinition>,
    sortable: Vec<String>,
    tags: Vec<(String, TagDefinition)>,
    default_sort: Option<Vec<SortKey>>,
    base_filter: Predicate,
}

impl FilterRegistryBuilder {
    /// Declare a filter; its field (if any) becomes sortable
    pub fn filter(mut self, definition: FilterDefinition) -> Self {
        self.filters.push(definition);
        self
    }

    /// Declare a sortable field that has no filter
    pub fn sortable(mut self, field: impl Into<String>) -> Self {
        self.sortable.push(field.into());
        self
    }

    /// Allow `tag.<name>:<value>` identifiers, looked up on `field`
    pub fn tag(mut self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.tags.push((
            name.into(),
            TagDefinition {
                field: field.into(),
                normalize: None,
            },
        ));
        self
    }

    /// Like [`tag`](Self::tag), rewriting the value before lookup
    pub fn normalized_tag<F>(
        mut self,
        name: impl Into<String>,
        field: impl Into<String>,
        normalize: F,
    ) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.tags.push((
            name.into(),
            TagDefinition {
                field: field.into(),
                normalize: Some(Arc::new(normalize)),
            },
        ));
        self
    }

    /// Restrict every list and lookup to records matching `predicate`
    /// (e.g. hide soft-deleted records)
    pub fn base_filter(mut self, predicate: Predicate) -> Self {
        self.base_filter = predicate;
        self
    }

    /// Sort used when a request names none (defaults to `-created_at`)
    pub fn default_sort(mut self, sort: Vec<SortKey>) -> Self {
        self.default_sort = Some(sort);
        self
    }

    pub fn build(self) -> Result<FilterRegistry, ConfigError> {
        let mut filters = BTreeMap::new();
        let mut sortable: BTreeSet<String> = self.sortable.into_iter().collect();

        for definition in self.filters {
            if let ValueType::Enum(variants) = &definition.value_type
                && variants.is_empty()
            {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.{}", self.entity, definition.key),
                    value: "[]".to_string(),
                    message: "enum filters need at least one variant".to_string(),
                });
            }

            if definition.allow_multiple
                && let FilterTarget::Field { mode, .. } = &definition.target
                && *mode != FilterMode::Equals
            {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.{}", self.entity, definition.key),
                    value: "allow_multiple".to_string(),
                    message: "range filters take a single value".to_string(),
                });
            }

            if let Some(field) = definition.field() {
                sortable.insert(field.to_string());
            }

            if filters.contains_key(&definition.key) {
                return Err(ConfigError::DuplicateKey {
                    entity: self.entity,
                    key: definition.key,
                });
            }
            filters.insert(definition.key.clone(), definition);
        }

        let mut tags = BTreeMap::new();
        for (name, tag) in self.tags {
            let valid = !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.tags", self.entity),
                    value: name,
                    message: "tag names are limited to ASCII letters, digits and '_'"
                        .to_string(),
                });
            }
            tags.insert(name, tag);
        }

        Ok(FilterRegistry {
            entity: self.entity,
            filters,
            sortable,
            tags,
            default_sort: self
                .default_sort
                .unwrap_or_else(|| vec![SortKey::desc("created_at")]),
            base_filter: self.base_filter,
        })
    }
}
