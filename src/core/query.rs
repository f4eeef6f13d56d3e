//! List parameters, pagination and the paginated response envelope

use crate::core::error::QueryError;
use crate::core::tenant::TenantId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Keys consumed by the parser itself; everything else is a candidate filter
pub const RESERVED_KEYS: &[&str] = &["page", "pageSize", "limit", "sort"];

/// Untyped request parameters, one JSON value per key
///
/// Values are strings, numbers, booleans or arrays of those. URL query strings
/// only ever produce strings and arrays of strings.
///
/// # Example
/// ```rust,ignore
/// // GET /flights?aircraft[]=a&aircraft[]=b&dateFrom=2024-01-01&page=2
/// let params = RawParams::from_pairs(pairs);
/// assert!(params.get("aircraft").unwrap().is_array());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParams(BTreeMap<String, Value>);

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from decoded URL query pairs
    ///
    /// A key that occurs more than once, or is written `key[]`, becomes an
    /// array in order of appearance. A single plain occurrence stays a string.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = BTreeMap::new();

        for (key, value) in pairs {
            let key = key.as_ref();
            let (key, bracketed) = match key.strip_suffix("[]") {
                Some(stripped) => (stripped, true),
                None => (key, false),
            };
            let value = Value::String(value.into());

            match params.remove(key) {
                None if bracketed => {
                    params.insert(key.to_string(), Value::Array(vec![value]));
                }
                None => {
                    params.insert(key.to_string(), value);
                }
                Some(Value::Array(mut items)) => {
                    items.push(value);
                    params.insert(key.to_string(), Value::Array(items));
                }
                Some(previous) => {
                    params.insert(key.to_string(), Value::Array(vec![previous, value]));
                }
            }
        }

        Self(params)
    }

    /// Insert a value, replacing any previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for RawParams {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Pagination bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            max_page_size: 200,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One sort criterion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Parse a comma-separated sort expression (`designation,-created_at`)
    ///
    /// Empty segments are skipped. Field names are not checked against any
    /// entity here.
    pub fn parse_list(expression: &str) -> Result<Vec<SortKey>, QueryError> {
        expression
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(Self::parse_segment)
            .collect()
    }

    fn parse_segment(segment: &str) -> Result<SortKey, QueryError> {
        let (field, direction) = match segment.strip_prefix('-') {
            Some(field) => (field, SortDirection::Descending),
            None => (segment, SortDirection::Ascending),
        };

        let valid = !field.is_empty()
            && field
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');

        if !valid {
            return Err(QueryError::MalformedSort {
                segment: segment.to_string(),
            });
        }

        Ok(SortKey {
            field: field.to_string(),
            direction,
        })
    }
}

/// A normalized list request
///
/// Built only through [`ListQuery::parse`] (or [`ListQuery::new`]), so page and
/// page size are always positive and within bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    tenant_id: TenantId,
    page: u64,
    page_size: u64,
    sort: Vec<SortKey>,
    raw_filters: BTreeMap<String, Value>,
}

impl ListQuery {
    /// An unfiltered first page for the tenant
    pub fn new(tenant_id: TenantId, pagination: &PaginationConfig) -> Self {
        Self {
            tenant_id,
            page: 1,
            page_size: pagination.default_page_size.max(1),
            sort: Vec::new(),
            raw_filters: BTreeMap::new(),
        }
    }

    /// Parse untrusted request parameters
    ///
    /// Bad `page`/`pageSize` values fall back to defaults and oversized pages
    /// are clamped. Only malformed sort syntax is rejected.
    pub fn parse(
        params: RawParams,
        tenant_id: TenantId,
        pagination: &PaginationConfig,
    ) -> Result<Self, QueryError> {
        let mut params = params.into_inner();
        let mut query = Self::new(tenant_id, pagination);

        if let Some(page) = params.remove("page").as_ref().and_then(positive_integer) {
            query.page = page;
        }

        let size_param = params.remove("pageSize");
        let limit_param = params.remove("limit");
        if let Some(size) = size_param.or(limit_param).as_ref().and_then(positive_integer) {
            query.page_size = query.clamp_page_size(size, pagination);
        }

        if let Some(sort) = params.remove("sort") {
            query.sort = parse_sort_value(&sort)?;
        }

        query.raw_filters = params;
        Ok(query)
    }

    fn clamp_page_size(&self, requested: u64, pagination: &PaginationConfig) -> u64 {
        let max = pagination.max_page_size.max(1);
        if requested > max {
            tracing::debug!(requested, max, "clamping page size");
            max
        } else {
            requested
        }
    }

    /// Replace the sort criteria
    pub fn with_sort(mut self, sort: Vec<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    /// Add a raw filter
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.raw_filters.insert(key.into(), value.into());
        self
    }

    /// Move to another page (values below 1 become 1)
    pub fn with_page(mut self, page: u64) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn sort(&self) -> &[SortKey] {
        &self.sort
    }

    pub fn raw_filters(&self) -> &BTreeMap<String, Value> {
        &self.raw_filters
    }

    /// Number of records before this page
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// A positive integer parameter; digit strings too long for `u64` saturate
fn positive_integer(value: &Value) -> Option<u64> {
    let number = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 1.0).map(|f| f as u64)),
        Value::String(s) => parse_digits(s.trim()),
        _ => None,
    };
    number.filter(|n| *n >= 1)
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.parse::<u64>().unwrap_or(u64::MAX))
}

fn parse_sort_value(value: &Value) -> Result<Vec<SortKey>, QueryError> {
    match value {
        Value::String(s) => SortKey::parse_list(s),
        Value::Array(items) => {
            let mut keys = Vec::new();
            for item in items {
                keys.extend(parse_sort_value(item)?);
            }
            Ok(keys)
        }
        other => Err(QueryError::MalformedSort {
            segment: other.to_string(),
        }),
    }
}

/// Paginated response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// The records of this page
    pub data: Vec<T>,

    /// Pagination metadata
    pub meta: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: u64,

    /// Number of items per page
    pub page_size: u64,

    /// Total number of matching records
    pub total_count: u64,

    /// Total number of pages
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: u64, page_size: u64, total_count: u64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = if total_count == 0 {
            0
        } else {
            total_count.div_ceil(page_size)
        };

        Self {
            page,
            page_size,
            total_count,
            total_pages,
        }
    }
}
