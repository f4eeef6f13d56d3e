//! Shared test harness for record store testing
//!
//! Provides a deterministic two-tenant flight fixture, a recording store that
//! counts and optionally fails store calls, and the `record_store_tests!`
//! contract suite.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod store_harness;
//! use store_harness::*;
//! ```

#![allow(dead_code)]

pub mod record_store_tests;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use listq::core::error::StorageError;
use listq::core::query::SortKey;
use listq::core::store::{RecordStore, ScopedFilter};
use listq::core::tenant::TenantId;
use listq::entities::Flight;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// Midnight UTC, 1 March 2024
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

/// A flight of `tenant` flown `day` days after [`base_time`]
///
/// Created one hour per day after the base time, scored `50 + 5 * day`, and
/// tagged `customId = <prefix>_<day>`.
pub fn flight(tenant: TenantId, aircraft_id: Uuid, departure: &str, day: i64, prefix: &str) -> Flight {
    let pilot = Uuid::from_u128(0xA11CE);
    Flight::new(
        tenant,
        aircraft_id,
        base_time() + Duration::days(day) + Duration::hours(9),
        Some(departure.to_string()),
        Some("KBOS".to_string()),
        pilot,
        None,
        pilot,
        None,
        None,
        Some(50.0 + 5.0 * day as f64),
        BTreeMap::new(),
    )
    .with_tag("customId", format!("{}_{}", prefix, day))
    .created(base_time() + Duration::hours(day))
}

/// Flights of two tenants sharing tag values
pub struct Fleet {
    pub tenant_a: TenantId,
    pub tenant_b: TenantId,
    /// Aircraft flown by the first four flights of tenant A
    pub trainer: Uuid,
    pub flights_a: Vec<Flight>,
    pub flights_b: Vec<Flight>,
}

impl Fleet {
    pub fn new() -> Self {
        let tenant_a = TenantId::new(Uuid::new_v4());
        let tenant_b = TenantId::new(Uuid::new_v4());
        let trainer = Uuid::new_v4();
        let other = Uuid::new_v4();

        let departures_a = ["KBOS", "KJFK", "KBOS", "KPVD", "KJFK", "KBOS", "KPVD"];
        let flights_a = departures_a
            .iter()
            .enumerate()
            .map(|(day, departure)| {
                let aircraft = if day < 4 { trainer } else { other };
                flight(tenant_a, aircraft, departure, day as i64, "A")
            })
            .collect();

        let flights_b = ["KBOS", "KBOS", "KJFK"]
            .iter()
            .enumerate()
            .map(|(day, departure)| flight(tenant_b, trainer, departure, day as i64, "A"))
            .collect();

        Self {
            tenant_a,
            tenant_b,
            trainer,
            flights_a,
            flights_b,
        }
    }

    /// Every flight of both tenants
    pub fn all(&self) -> Vec<Flight> {
        self.flights_a
            .iter()
            .chain(self.flights_b.iter())
            .cloned()
            .collect()
    }
}

impl Default for Fleet {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// RecordingStore: counts calls and fails on demand
// ---------------------------------------------------------------------------

/// Wraps a store, counting calls and failing every call after `fail_after`
pub struct RecordingStore<S> {
    inner: S,
    fail_after: Option<usize>,
    calls: AtomicUsize,
}

impl<S> RecordingStore<S> {
    /// Count calls, never fail
    pub fn counting(inner: S) -> Self {
        Self {
            inner,
            fail_after: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Let `successes` calls through, then fail every call
    pub fn failing_after(inner: S, successes: usize) -> Self {
        Self {
            inner,
            fail_after: Some(successes),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), StorageError> {
        let previous = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_after {
            Some(limit) if previous >= limit => Err(StorageError::Unavailable {
                backend: "recording".to_string(),
                message: "connection refused".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<S: RecordStore<Flight>> RecordStore<Flight> for RecordingStore<S> {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    async fn count(&self, filter: &ScopedFilter) -> Result<u64, StorageError> {
        self.enter()?;
        self.inner.count(filter).await
    }

    async fn find(
        &self,
        filter: &ScopedFilter,
        sort: &[SortKey],
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Flight>, StorageError> {
        self.enter()?;
        self.inner.find(filter, sort, skip, limit).await
    }

    async fn find_one(&self, filter: &ScopedFilter) -> Result<Option<Flight>, StorageError> {
        self.enter()?;
        self.inner.find_one(filter).await
    }

    async fn delete_one(&self, filter: &ScopedFilter) -> Result<Option<Flight>, StorageError> {
        self.enter()?;
        self.inner.delete_one(filter).await
    }

    async fn replace_one(&self, filter: &ScopedFilter, record: &Flight) -> Result<bool, StorageError> {
        self.enter()?;
        self.inner.replace_one(filter, record).await
    }
}

// ---------------------------------------------------------------------------
// StallingStore: never answers in time
// ---------------------------------------------------------------------------

/// A store whose every call takes ten seconds
pub struct StallingStore;

impl StallingStore {
    async fn stall() {
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
    }
}

#[async_trait]
impl RecordStore<Flight> for StallingStore {
    fn backend_name(&self) -> &'static str {
        "stalling"
    }

    async fn count(&self, _filter: &ScopedFilter) -> Result<u64, StorageError> {
        Self::stall().await;
        Ok(0)
    }

    async fn find(
        &self,
        _filter: &ScopedFilter,
        _sort: &[SortKey],
        _skip: u64,
        _limit: u64,
    ) -> Result<Vec<Flight>, StorageError> {
        Self::stall().await;
        Ok(Vec::new())
    }

    async fn find_one(&self, _filter: &ScopedFilter) -> Result<Option<Flight>, StorageError> {
        Self::stall().await;
        Ok(None)
    }

    async fn delete_one(&self, _filter: &ScopedFilter) -> Result<Option<Flight>, StorageError> {
        Self::stall().await;
        Ok(None)
    }

    async fn replace_one(&self, _filter: &ScopedFilter, _record: &Flight) -> Result<bool, StorageError> {
        Self::stall().await;
        Ok(false)
    }
}
