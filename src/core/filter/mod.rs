//! Declarative filtering: definitions, per-entity registries and the compiler
//! that turns raw request filters into store-agnostic predicates

pub mod compiler;
pub mod definition;
pub mod predicate;
pub mod registry;

pub use compiler::DynamicFilterParser;
pub use definition::{CoercionError, FilterDefinition, FilterMode, FilterTarget, ValueType};
pub use predicate::{CompareOp, CompiledPredicate, Predicate};
pub use registry::{FilterRegistry, FilterRegistryBuilder, TagDefinition, TagNormalizer};
