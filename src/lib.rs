//! # listq
//!
//! A multi-tenant list query engine for record APIs in Rust.
//!
//! ## Features
//!
//! - **Declarative Filters**: Per-entity registries of public filter keys, typed values and modes
//! - **Tenant Isolation**: Every store query is scoped to the caller's account
//! - **Deterministic Pagination**: Page/page size bounds and a stable `id` tie-breaker
//! - **Flexible Identifiers**: Resolve records by id or by `tag.<name>:<value>`
//! - **Configuration-Based**: Declare registries in YAML or in code
//! - **Soft Deletes**: Registries can hide flagged records from every list and lookup
//! - **Pluggable Storage**: In-memory store by default, MongoDB behind a feature flag
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use listq::prelude::*;
//!
//! let store = Arc::new(InMemoryStore::<Flight>::new());
//! let repository = Repository::new(store, Arc::new(flight_filters()?));
//!
//! let mut params = RawParams::new();
//! params.insert("departure", vec!["KJFK", "KBOS"]);
//! params.insert("sort", "-flight_date");
//!
//! let query = ListQuery::parse(params, tenant_id, &PaginationConfig::default())?;
//! let page = repository.find_with_params(&query).await?;
//!
//! let flight = repository.resolve_one("tag.customId:A_17", &tenant_id).await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::AuthContext,
        error::{EngineError, EngineResult},
        field::FieldValue,
        filter::{
            DynamicFilterParser, FilterDefinition, FilterMode, FilterRegistry, Predicate,
            ValueType,
        },
        identifier::{IdentifierResolver, Lookup},
        query::{ListQuery, Page, PaginationConfig, PaginationMeta, RawParams, SortKey},
        record::{FieldSource, Record},
        repository::{BatchOutcome, EngineSettings, Repository},
        store::{RecordStore, ScopedFilter},
        tenant::TenantId,
    };

    // === Macros ===
    pub use crate::impl_record;

    // === Entities ===
    pub use crate::entities::{
        Aircraft, Assessment, Flight, User, aircraft_filters, assessment_filters, flight_filters,
        retire_assessment, user_filters,
    };

    // === Storage ===
    pub use crate::storage::InMemoryStore;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoStore;

    // === Config ===
    pub use crate::config::{EngineConfig, EntityQueryConfig};

    // === Server ===
    pub use crate::server::{ServerBuilder, assessment_routes, entity_routes};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
    pub use uuid::Uuid;

    // === Axum ===
    pub use axum::{Extension, Router};
}
