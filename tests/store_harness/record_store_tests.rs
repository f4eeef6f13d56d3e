//! Macro-generated contract suite for `RecordStore<Flight>` implementations.
//!
//! The `record_store_tests!` macro drives a store through a [`Repository`]
//! with the production flight registry, so each backend is checked against
//! the behaviour callers actually see: tenant scoping, filters, pagination,
//! deterministic ordering and identifier resolution.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod store_harness;
//!
//! use store_harness::*;
//!
//! async fn seeded(flights: Vec<Flight>) -> InMemoryStore<Flight> {
//!     InMemoryStore::with_records(flights)
//! }
//!
//! record_store_tests!(seeded);
//! ```
//!
//! `$seed` names an async function that receives the fixture flights and
//! returns a store holding exactly those records. It is called once per test.
//!
//! Sorted fields in these tests never hold null values, since backends
//! disagree on where nulls go.

/// Generate the `RecordStore<Flight>` contract test suite.
#[macro_export]
macro_rules! record_store_tests {
    ($seed:ident) => {
        mod record_store_contract_tests {
            use super::*;
            use listq::core::error::EngineError;
            use listq::core::query::{ListQuery, PaginationConfig, SortKey};
            use listq::core::record::Record;
            use listq::core::repository::Repository;
            use listq::core::store::RecordStore;
            use listq::core::tenant::TenantId;
            use listq::entities::{Flight, flight_filters};
            use chrono::{DateTime, Duration, TimeZone, Utc};
            use serde_json::json;
            use std::collections::HashSet;
            use std::sync::Arc;
            use uuid::Uuid;

            async fn repository(fleet: &Fleet) -> Repository<Flight, impl RecordStore<Flight>> {
                repository_with(fleet, Vec::new()).await
            }

            /// The fleet plus `extra` flights
            async fn repository_with(
                fleet: &Fleet,
                extra: Vec<Flight>,
            ) -> Repository<Flight, impl RecordStore<Flight>> {
                let mut flights = fleet.all();
                flights.extend(extra);
                let store = $seed(flights).await;
                Repository::new(Arc::new(store), Arc::new(flight_filters().unwrap()))
            }

            /// A flight of `tenant` flown at `flight_date`
            fn flown_at(tenant: TenantId, day: i64, flight_date: DateTime<Utc>) -> Flight {
                let mut flight = flight(tenant, Uuid::new_v4(), "KBOS", day, "T");
                flight.flight_date = flight_date;
                flight
            }

            fn end_of_january() -> DateTime<Utc> {
                Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()
            }

            fn query(tenant: TenantId) -> ListQuery {
                ListQuery::new(tenant, &PaginationConfig::default())
            }

            fn ids(flights: &[Flight]) -> Vec<Uuid> {
                flights.iter().map(Record::id).collect()
            }

            // ==================================================================
            // Tenant isolation
            // ==================================================================

            #[tokio::test]
            async fn test_lists_only_own_tenant() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;

                let page = repo.find_with_params(&query(fleet.tenant_a)).await.unwrap();
                assert_eq!(page.meta.total_count, 7);
                assert!(page.data.iter().all(|f| f.tenant_id == fleet.tenant_a));

                let page = repo.find_with_params(&query(fleet.tenant_b)).await.unwrap();
                assert_eq!(page.meta.total_count, 3);
                assert!(page.data.iter().all(|f| f.tenant_id == fleet.tenant_b));
            }

            #[tokio::test]
            async fn test_shared_reference_stays_scoped() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;

                let q = query(fleet.tenant_a).with_filter("aircraft", fleet.trainer.to_string());
                let page = repo.find_with_params(&q).await.unwrap();
                assert_eq!(page.meta.total_count, 4);
                assert!(page.data.iter().all(|f| f.aircraft_id == fleet.trainer));
            }

            #[tokio::test]
            async fn test_other_tenant_id_resolves_to_nothing() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;
                let foreign = fleet.flights_a[0].id.to_string();

                assert!(repo.resolve_one(&foreign, &fleet.tenant_b).await.unwrap().is_none());
                assert!(repo.delete_one(&foreign, &fleet.tenant_b).await.unwrap().is_none());
                assert!(repo.resolve_one(&foreign, &fleet.tenant_a).await.unwrap().is_some());
            }

            // ==================================================================
            // Pagination and ordering
            // ==================================================================

            #[tokio::test]
            async fn test_pages_cover_every_record_once() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;
                let base = ListQuery::parse(
                    [("pageSize", json!(2))].into_iter().collect(),
                    fleet.tenant_a,
                    &PaginationConfig::default(),
                )
                .unwrap()
                .with_sort(vec![SortKey::asc("departure_airport")]);

                let mut seen = Vec::new();
                for page_number in 1..=4 {
                    let page = repo
                        .find_with_params(&base.clone().with_page(page_number))
                        .await
                        .unwrap();
                    assert_eq!(page.meta.total_count, 7);
                    assert_eq!(page.meta.total_pages, 4);
                    assert_eq!(page.meta.page, page_number);
                    seen.extend(ids(&page.data));
                }

                let unique: HashSet<Uuid> = seen.iter().copied().collect();
                assert_eq!(seen.len(), 7);
                assert_eq!(unique, ids(&fleet.flights_a).into_iter().collect());

                let beyond = repo.find_with_params(&base.with_page(5)).await.unwrap();
                assert!(beyond.data.is_empty());
                assert_eq!(beyond.meta.total_count, 7);
            }

            #[tokio::test]
            async fn test_ties_are_broken_by_id() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;
                let q = query(fleet.tenant_a).with_sort(vec![SortKey::asc("departure_airport")]);

                let first = repo.find_with_params(&q).await.unwrap().data;
                let second = repo.find_with_params(&q).await.unwrap().data;
                assert_eq!(ids(&first), ids(&second));

                for pair in first.windows(2) {
                    let (a, b) = (&pair[0], &pair[1]);
                    assert!(a.departure_airport <= b.departure_airport);
                    if a.departure_airport == b.departure_airport {
                        assert!(a.id < b.id);
                    }
                }
            }

            #[tokio::test]
            async fn test_default_sort_is_newest_first() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;

                let page = repo.find_with_params(&query(fleet.tenant_a)).await.unwrap();
                let newest = fleet.flights_a.last().unwrap();
                assert_eq!(page.data[0].id, newest.id);
            }

            #[tokio::test]
            async fn test_descending_sort() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;
                let q = query(fleet.tenant_a).with_sort(vec![SortKey::desc("score")]);

                let page = repo.find_with_params(&q).await.unwrap();
                let scores: Vec<f64> = page.data.iter().filter_map(|f| f.score).collect();
                assert_eq!(scores, vec![80.0, 75.0, 70.0, 65.0, 60.0, 55.0, 50.0]);
            }

            // ==================================================================
            // Filters
            // ==================================================================

            #[tokio::test]
            async fn test_in_set_filter() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;

                let q = query(fleet.tenant_a).with_filter("departure", json!(["KBOS", "KJFK"]));
                let page = repo.find_with_params(&q).await.unwrap();
                assert_eq!(page.meta.total_count, 5);

                let q = query(fleet.tenant_a).with_filter("departure", "KPVD");
                let page = repo.find_with_params(&q).await.unwrap();
                assert_eq!(page.meta.total_count, 2);
            }

            #[tokio::test]
            async fn test_empty_in_set_matches_nothing() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;

                let q = query(fleet.tenant_a).with_filter("departure", json!([]));
                let page = repo.find_with_params(&q).await.unwrap();
                assert!(page.data.is_empty());
                assert_eq!(page.meta.total_count, 0);
                assert_eq!(page.meta.total_pages, 0);
            }

            #[tokio::test]
            async fn test_numeric_range() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;

                let q = query(fleet.tenant_a)
                    .with_filter("scoreMin", "60")
                    .with_filter("scoreMax", 70);
                let page = repo.find_with_params(&q).await.unwrap();
                assert_eq!(page.meta.total_count, 3);
            }

            #[tokio::test]
            async fn test_date_range_includes_last_day() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;

                let q = query(fleet.tenant_a)
                    .with_filter("dateFrom", "2024-03-03")
                    .with_filter("dateTo", "2024-03-04");
                let page = repo.find_with_params(&q).await.unwrap();
                assert_eq!(
                    ids(&page.data).into_iter().collect::<HashSet<_>>(),
                    HashSet::from([fleet.flights_a[2].id, fleet.flights_a[3].id])
                );
            }

            #[tokio::test]
            async fn test_date_bounds_compare_instants() {
                let fleet = Fleet::new();
                let tenant = TenantId::new(Uuid::new_v4());
                let last_second = flown_at(
                    tenant,
                    0,
                    end_of_january() + Duration::hours(23) + Duration::minutes(59) + Duration::seconds(59),
                );
                let half_past_midnight = flown_at(
                    tenant,
                    1,
                    end_of_january() + Duration::milliseconds(500),
                );
                let next_day = flown_at(tenant, 2, end_of_january() + Duration::days(1));
                let repo = repository_with(
                    &fleet,
                    vec![last_second.clone(), half_past_midnight.clone(), next_day.clone()],
                )
                .await;

                let q = query(tenant)
                    .with_filter("dateFrom", "2024-01-31")
                    .with_filter("dateTo", "2024-01-31");
                let page = repo.find_with_params(&q).await.unwrap();
                assert_eq!(
                    ids(&page.data).into_iter().collect::<HashSet<_>>(),
                    HashSet::from([last_second.id, half_past_midnight.id])
                );

                let q = query(tenant).with_filter("dateFrom", "2024-02-01");
                let page = repo.find_with_params(&q).await.unwrap();
                assert_eq!(ids(&page.data), vec![next_day.id]);
            }

            #[tokio::test]
            async fn test_same_second_dates_sort_by_instant() {
                let fleet = Fleet::new();
                let tenant = TenantId::new(Uuid::new_v4());
                let on_the_second = flown_at(tenant, 0, end_of_january());
                let quarter = flown_at(tenant, 1, end_of_january() + Duration::milliseconds(250));
                let half = flown_at(tenant, 2, end_of_january() + Duration::milliseconds(500));
                let repo = repository_with(
                    &fleet,
                    vec![half.clone(), on_the_second.clone(), quarter.clone()],
                )
                .await;

                let q = query(tenant).with_sort(vec![SortKey::asc("flight_date")]);
                let page = repo.find_with_params(&q).await.unwrap();
                assert_eq!(ids(&page.data), vec![on_the_second.id, quarter.id, half.id]);

                let q = query(tenant).with_sort(vec![SortKey::desc("flight_date")]);
                let page = repo.find_with_params(&q).await.unwrap();
                assert_eq!(ids(&page.data), vec![half.id, quarter.id, on_the_second.id]);
            }

            // ==================================================================
            // Identifiers
            // ==================================================================

            #[tokio::test]
            async fn test_resolve_by_id_and_tag() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;
                let target = &fleet.flights_a[3];

                let by_id = repo
                    .resolve_one(&target.id.to_string(), &fleet.tenant_a)
                    .await
                    .unwrap();
                assert_eq!(by_id.map(|f| f.id), Some(target.id));

                let by_tag = repo.resolve_one("tag.customId:A_3", &fleet.tenant_a).await.unwrap();
                assert_eq!(by_tag.map(|f| f.id), Some(target.id));

                let other = repo
                    .resolve_one("tag.customId:A_2", &fleet.tenant_b)
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(other.tenant_id, fleet.tenant_b);
            }

            #[tokio::test]
            async fn test_malformed_id_matches_nothing() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;

                let found = repo.resolve_one("not-a-uuid", &fleet.tenant_a).await.unwrap();
                assert!(found.is_none());
            }

            #[tokio::test]
            async fn test_unknown_tag_is_rejected() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;

                let err = repo
                    .resolve_one("tag.tailNumber:N1", &fleet.tenant_a)
                    .await
                    .unwrap_err();
                assert!(matches!(err, EngineError::Identifier(_)));
            }

            // ==================================================================
            // Deletes
            // ==================================================================

            #[tokio::test]
            async fn test_delete_by_tag_stays_in_tenant() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;

                let deleted = repo
                    .delete_one("tag.customId:A_1", &fleet.tenant_b)
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(deleted.id, fleet.flights_b[1].id);

                assert!(repo.resolve_one("tag.customId:A_1", &fleet.tenant_b).await.unwrap().is_none());
                assert!(repo.resolve_one("tag.customId:A_1", &fleet.tenant_a).await.unwrap().is_some());
            }

            #[tokio::test]
            async fn test_delete_each_reports_each_token() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;
                let missing = Uuid::new_v4().to_string();
                let tokens = vec![
                    fleet.flights_a[0].id.to_string(),
                    "tag.customId:A_6".to_string(),
                    missing.clone(),
                ];

                let outcome = repo.delete_each(&tokens[..], &fleet.tenant_a).await.unwrap();
                assert!(outcome.is_complete());
                assert_eq!(
                    ids(&outcome.succeeded),
                    vec![fleet.flights_a[0].id, fleet.flights_a[6].id]
                );
                assert_eq!(outcome.not_found, vec![missing]);
                assert!(outcome.skipped.is_empty());

                let page = repo.find_with_params(&query(fleet.tenant_a)).await.unwrap();
                assert_eq!(page.meta.total_count, 5);
            }

            #[tokio::test]
            async fn test_delete_each_validates_before_deleting() {
                let fleet = Fleet::new();
                let repo = repository(&fleet).await;
                let tokens = [fleet.flights_a[0].id.to_string(), "tag.unknown:x".to_string()];

                let err = repo.delete_each(&tokens[..], &fleet.tenant_a).await.unwrap_err();
                assert!(matches!(err, EngineError::Identifier(_)));

                let page = repo.find_with_params(&query(fleet.tenant_a)).await.unwrap();
                assert_eq!(page.meta.total_count, 7);
            }
        }
    };
}
