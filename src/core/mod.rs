//! Core module containing the query engine: records, filters, identifiers
//! and the repository that ties them to a store

pub mod auth;
pub mod error;
pub mod field;
pub mod filter;
pub mod identifier;
pub mod query;
pub mod record;
pub mod repository;
pub mod store;
pub mod tenant;

pub use auth::AuthContext;
pub use error::{EngineError, EngineResult};
pub use field::FieldValue;
pub use filter::{DynamicFilterParser, FilterDefinition, FilterRegistry, Predicate};
pub use identifier::{IdentifierResolver, Lookup};
pub use query::{ListQuery, Page, PaginationConfig, PaginationMeta, RawParams, SortKey};
pub use record::{FieldSource, Record};
pub use repository::{BatchOutcome, EngineSettings, Repository};
pub use store::{RecordStore, ScopedFilter};
pub use tenant::TenantId;
