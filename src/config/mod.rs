//! Configuration loading and management

use crate::core::error::ConfigError;
use crate::core::filter::{FilterDefinition, FilterMode, FilterRegistry, Predicate, ValueType};
use crate::core::query::{PaginationConfig, SortKey};
use crate::core::repository::EngineSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Declared type of a filter value, as written in YAML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTypeConfig {
    String,
    Number,
    Boolean,
    Date,
    Enum,
    IdReference,
}

/// Comparison mode, as written in YAML
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterModeConfig {
    #[default]
    Equals,
    AtLeast,
    AtMost,
}

/// One filter declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Public query parameter name
    pub key: String,

    /// Store field (defaults to the key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    pub value_type: ValueTypeConfig,

    /// Allowed values of an `enum` filter
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,

    #[serde(default)]
    pub mode: FilterModeConfig,

    #[serde(default)]
    pub allow_multiple: bool,
}

/// One tag declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagConfig {
    /// Name used in `tag.<name>:<value>`
    pub name: String,

    /// Store field (defaults to the name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Rewrite applied to the value before lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize: Option<TagNormalizeConfig>,
}

/// Tag value rewrites, as written in YAML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagNormalizeConfig {
    /// Trim and upper-case (designations)
    Uppercase,
    /// Trim and lower-case
    Lowercase,
}

impl TagNormalizeConfig {
    fn apply(self, value: &str) -> String {
        match self {
            TagNormalizeConfig::Uppercase => value.trim().to_uppercase(),
            TagNormalizeConfig::Lowercase => value.trim().to_lowercase(),
        }
    }
}

/// Query configuration of one entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityQueryConfig {
    /// Entity name (e.g., "aircraft", "flight")
    pub entity: String,

    #[serde(default)]
    pub filters: Vec<FilterConfig>,

    /// Sortable fields without a filter
    #[serde(default)]
    pub sortable: Vec<String>,

    #[serde(default)]
    pub tags: Vec<TagConfig>,

    /// Sort expression such as `-created_at` or `designation,-created_at`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sort: Option<String>,

    /// Boolean fields that hide a record from lists and lookups when true
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden_flags: Vec<String>,
}

impl EntityQueryConfig {
    /// Build the registry this declaration describes
    pub fn build_registry(&self) -> Result<FilterRegistry, ConfigError> {
        let mut builder = FilterRegistry::builder(&self.entity);

        for filter in &self.filters {
            builder = builder.filter(self.filter_definition(filter)?);
        }
        for field in &self.sortable {
            builder = builder.sortable(field);
        }
        for tag in &self.tags {
            let field = tag.field.as_ref().unwrap_or(&tag.name);
            builder = match tag.normalize {
                Some(rewrite) => builder.normalized_tag(&tag.name, field, move |v| rewrite.apply(v)),
                None => builder.tag(&tag.name, field),
            };
        }
        if !self.hidden_flags.is_empty() {
            builder = builder.base_filter(Predicate::and(
                self.hidden_flags
                    .iter()
                    .map(|flag| Predicate::eq(flag.as_str(), false)),
            ));
        }
        if let Some(expression) = &self.default_sort {
            let sort = SortKey::parse_list(expression).map_err(|e| ConfigError::InvalidValue {
                field: format!("{}.default_sort", self.entity),
                value: expression.clone(),
                message: e.to_string(),
            })?;
            builder = builder.default_sort(sort);
        }

        builder.build()
    }

    fn filter_definition(&self, filter: &FilterConfig) -> Result<FilterDefinition, ConfigError> {
        let value_type = match filter.value_type {
            ValueTypeConfig::String => ValueType::String,
            ValueTypeConfig::Number => ValueType::Number,
            ValueTypeConfig::Boolean => ValueType::Boolean,
            ValueTypeConfig::Date => ValueType::Date,
            ValueTypeConfig::Enum => ValueType::Enum(filter.variants.clone()),
            ValueTypeConfig::IdReference => ValueType::IdReference,
        };

        if !filter.variants.is_empty() && filter.value_type != ValueTypeConfig::Enum {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.{}.variants", self.entity, filter.key),
                value: format!("{:?}", filter.variants),
                message: "variants are only allowed on enum filters".to_string(),
            });
        }

        let mode = match filter.mode {
            FilterModeConfig::Equals => FilterMode::Equals,
            FilterModeConfig::AtLeast => FilterMode::AtLeast,
            FilterModeConfig::AtMost => FilterMode::AtMost,
        };
        let field = filter.field.as_ref().unwrap_or(&filter.key);

        let definition = FilterDefinition::with_mode(&filter.key, field, mode, value_type);
        Ok(if filter.allow_multiple {
            definition.multiple()
        } else {
            definition
        })
    }
}

/// Complete configuration of the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Timeout for one store round-trip, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_timeout_ms: Option<u64>,

    #[serde(default)]
    pub entities: Vec<EntityQueryConfig>,
}

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Check bounds and that every entity declaration builds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.default_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.default_page_size".to_string(),
                value: "0".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.pagination.max_page_size < self.pagination.default_page_size {
            return Err(ConfigError::InvalidValue {
                field: "pagination.max_page_size".to_string(),
                value: self.pagination.max_page_size.to_string(),
                message: "must not be below default_page_size".to_string(),
            });
        }
        for entity in &self.entities {
            entity.build_registry()?;
        }
        Ok(())
    }

    /// Runtime settings for repositories
    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            pagination: self.pagination,
            query_timeout: self.query_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Build the registry declared for `entity`
    pub fn registry_for(&self, entity: &str) -> Result<FilterRegistry, ConfigError> {
        self.entities
            .iter()
            .find(|e| e.entity == entity)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "entities".to_string(),
                value: entity.to_string(),
                message: "no query configuration for this entity".to_string(),
            })?
            .build_registry()
    }

    /// Create a default configuration for testing
    pub fn default_config() -> Self {
        Self {
            pagination: PaginationConfig::default(),
            query_timeout_ms: Some(5000),
            entities: Vec::new(),
        }
    }
}
