//! HTTP exposure of repositories
//!
//! This module provides:
//! - `entity_routes`: list, get and delete routes for one record type
//! - `assessment_routes`: the same for assessments, with soft deletes
//! - `ServerBuilder`: merges entity routes, health checks and tracing

pub mod builder;
pub mod rest;

pub use builder::ServerBuilder;
pub use rest::{assessment_routes, entity_routes};
