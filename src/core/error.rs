//! Typed error handling for the list query engine
//!
//! Every failure the engine can produce is one variant of [`EngineError`],
//! grouped by category so request handlers can tell client mistakes apart
//! from infrastructure failures.
//!
//! # Error Categories
//!
//! - [`QueryError`]: malformed pagination or sort syntax
//! - [`FilterError`]: unknown filter keys, uncoercible values, unknown sort fields
//! - [`IdentifierError`]: tag identifiers naming a field outside the allow-list
//! - [`StorageError`]: the record store failed or timed out
//! - [`ConfigError`]: invalid configuration or registry declarations
//! - [`RequestError`]: problems with the surrounding HTTP request
//!
//! # Example
//!
//! ```rust,ignore
//! match repository.find_with_params(&query).await {
//!     Ok(page) => Json(page).into_response(),
//!     Err(EngineError::Filter(FilterError::UnknownKey { key })) => {
//!         // caller asked for a filter this entity does not declare
//!     }
//!     Err(e) => e.into_response(),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type of the engine
#[derive(Debug)]
pub enum EngineError {
    /// Malformed list parameters
    Query(QueryError),

    /// Filter or sort validation failures
    Filter(FilterError),

    /// Identifier token failures
    Identifier(IdentifierError),

    /// A single-record lookup matched nothing (REST layer only)
    NotFound { entity_type: String, token: String },

    /// Record store failures
    Storage(StorageError),

    /// Configuration errors
    Config(ConfigError),

    /// HTTP/Request errors
    Request(RequestError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Query(e) => write!(f, "{}", e),
            EngineError::Filter(e) => write!(f, "{}", e),
            EngineError::Identifier(e) => write!(f, "{}", e),
            EngineError::NotFound { entity_type, token } => {
                write!(f, "{} '{}' not found", entity_type, token)
            }
            EngineError::Storage(e) => write!(f, "{}", e),
            EngineError::Config(e) => write!(f, "{}", e),
            EngineError::Request(e) => write!(f, "{}", e),
            EngineError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Query(e) => Some(e),
            EngineError::Filter(e) => Some(e),
            EngineError::Identifier(e) => Some(e),
            EngineError::Storage(e) => Some(e),
            EngineError::Config(e) => Some(e),
            EngineError::Request(e) => Some(e),
            EngineError::NotFound { .. } | EngineError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl EngineError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Query(_) => StatusCode::BAD_REQUEST,
            EngineError::Filter(_) => StatusCode::BAD_REQUEST,
            EngineError::Identifier(_) => StatusCode::BAD_REQUEST,
            EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::Storage(e) => e.status_code(),
            EngineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::Request(e) => e.status_code(),
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::Query(e) => e.error_code(),
            EngineError::Filter(e) => e.error_code(),
            EngineError::Identifier(_) => "INVALID_IDENTIFIER",
            EngineError::NotFound { .. } => "NOT_FOUND",
            EngineError::Storage(e) => e.error_code(),
            EngineError::Config(_) => "CONFIG_ERROR",
            EngineError::Request(e) => e.error_code(),
            EngineError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller caused this error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            EngineError::Filter(FilterError::UnknownKey { key })
            | EngineError::Filter(FilterError::BadValue { key, .. }) => {
                Some(serde_json::json!({ "key": key }))
            }
            EngineError::Filter(FilterError::UnknownSortField { field }) => {
                Some(serde_json::json!({ "sort": field }))
            }
            EngineError::Identifier(IdentifierError::UnknownTag { field }) => {
                Some(serde_json::json!({ "tag": field }))
            }
            EngineError::NotFound { entity_type, token } => Some(serde_json::json!({
                "entity_type": entity_type,
                "token": token
            })),
            _ => None,
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Query Errors
// =============================================================================

/// Errors raised while parsing raw list parameters
///
/// Pagination problems never land here: bad `page`/`pageSize` values fall back
/// to defaults.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    /// A `sort` segment is not `field` or `-field`
    MalformedSort { segment: String },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::MalformedSort { segment } => {
                write!(f, "Malformed sort segment '{}'", segment)
            }
        }
    }
}

impl std::error::Error for QueryError {}

impl QueryError {
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::MalformedSort { .. } => "INVALID_SORT",
        }
    }
}

impl From<QueryError> for EngineError {
    fn from(err: QueryError) -> Self {
        EngineError::Query(err)
    }
}

// =============================================================================
// Filter Errors
// =============================================================================

/// Errors raised while compiling raw filters against a registry
#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    /// The key is not declared for this entity
    UnknownKey { key: String },

    /// The value could not be coerced to the declared type
    BadValue { key: String, message: String },

    /// The sort field is not in the sortable allow-list
    UnknownSortField { field: String },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::UnknownKey { key } => write!(f, "Invalid filter: unknown key '{}'", key),
            FilterError::BadValue { key, message } => {
                write!(f, "Invalid filter: bad value for '{}': {}", key, message)
            }
            FilterError::UnknownSortField { field } => {
                write!(f, "Invalid sort: unknown field '{}'", field)
            }
        }
    }
}

impl std::error::Error for FilterError {}

impl FilterError {
    pub fn error_code(&self) -> &'static str {
        match self {
            FilterError::UnknownKey { .. } | FilterError::BadValue { .. } => "INVALID_FILTER",
            FilterError::UnknownSortField { .. } => "INVALID_SORT",
        }
    }
}

impl From<FilterError> for EngineError {
    fn from(err: FilterError) -> Self {
        EngineError::Filter(err)
    }
}

// =============================================================================
// Identifier Errors
// =============================================================================

/// Errors raised while resolving a path token
#[derive(Debug, Clone, PartialEq)]
pub enum IdentifierError {
    /// `tag.<field>:<value>` named a field outside the entity's tag allow-list
    UnknownTag { field: String },
}

impl fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierError::UnknownTag { field } => {
                write!(f, "Invalid identifier: tag field '{}' is not allowed", field)
            }
        }
    }
}

impl std::error::Error for IdentifierError {}

impl From<IdentifierError> for EngineError {
    fn from(err: IdentifierError) -> Self {
        EngineError::Identifier(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to record stores
#[derive(Debug, Clone)]
pub enum StorageError {
    /// The backend could not be reached
    Unavailable { backend: String, message: String },

    /// The query did not finish within the configured timeout
    Timeout { backend: String, millis: u64 },

    /// The backend rejected or failed the query
    QueryFailed { backend: String, message: String },

    /// A stored document could not be decoded into a record
    Decode { backend: String, message: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable { backend, message } => {
                write!(f, "Storage backend '{}' is unavailable: {}", backend, message)
            }
            StorageError::Timeout { backend, millis } => {
                write!(f, "{} query timed out after {}ms", backend, millis)
            }
            StorageError::QueryFailed { backend, message } => {
                write!(f, "{} query error: {}", backend, message)
            }
            StorageError::Decode { backend, message } => {
                write!(f, "Failed to decode {} record: {}", backend, message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl StorageError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StorageError::Unavailable { .. } | StorageError::Timeout { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            StorageError::QueryFailed { .. } | StorageError::Decode { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::Unavailable { .. } => "STORE_UNAVAILABLE",
            StorageError::Timeout { .. } => "STORE_TIMEOUT",
            StorageError::QueryFailed { .. } => "STORE_QUERY_FAILED",
            StorageError::Decode { .. } => "STORE_DECODE_FAILED",
        }
    }

    /// Whether retrying the same request later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::Unavailable { .. } | StorageError::Timeout { .. }
        )
    }
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        EngineError::Storage(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration and registry declarations
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// A registry declares the same key twice
    DuplicateKey { entity: String, key: String },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::DuplicateKey { entity, key } => {
                write!(f, "Duplicate filter key '{}' for entity '{}'", key, entity)
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Config(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP requests
#[derive(Debug)]
pub enum RequestError {
    /// No authenticated principal carrying a tenant
    MissingTenant,

    /// Removing the record would leave the tenant without any of its kind
    LastRemaining { entity_type: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::MissingTenant => {
                write!(f, "Unauthorized: request is not bound to a tenant")
            }
            RequestError::LastRemaining { entity_type } => {
                write!(f, "You must have at least one {}", entity_type)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::MissingTenant => StatusCode::UNAUTHORIZED,
            RequestError::LastRemaining { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::MissingTenant => "UNAUTHORIZED",
            RequestError::LastRemaining { .. } => "LAST_REMAINING",
        }
    }
}

impl From<RequestError> for EngineError {
    fn from(err: RequestError) -> Self {
        EngineError::Request(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
