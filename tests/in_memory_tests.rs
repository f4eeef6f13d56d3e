//! Integration tests for InMemoryStore using the store test harness.
//!
//! This file invokes `record_store_tests!` to validate that InMemoryStore
//! fully conforms to the RecordStore<Flight> contract.

#[macro_use]
mod store_harness;

use listq::entities::Flight;
use listq::storage::InMemoryStore;
use store_harness::*;

async fn seeded(flights: Vec<Flight>) -> InMemoryStore<Flight> {
    InMemoryStore::with_records(flights)
}

record_store_tests!(seeded);
