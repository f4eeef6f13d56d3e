//! MongoDB record store using the official MongoDB async driver.
//!
//! Provides `MongoStore<T>`, a [`RecordStore`] backed by a `mongodb::Database`.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! listq-rs = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Storage model
//!
//! One collection per record type, named after `T::resource_name()`
//! (e.g., "aircraft", "flights").
//!
//! # Serialization strategy
//!
//! Records are serialized via `serde_json::Value` as an intermediate format,
//! then converted to BSON documents. UUIDs are stored as strings. Top-level
//! timestamp fields are stored as BSON dates (millisecond precision) so range
//! filters and sorts compare instants, not text. Predicate values are converted
//! the same way. The `id` field is mapped to MongoDB's `_id` convention.

use crate::core::error::StorageError;
use crate::core::field::FieldValue;
use crate::core::filter::predicate::{CompareOp, Predicate};
use crate::core::identifier::ID_FIELD;
use crate::core::query::{SortDirection, SortKey};
use crate::core::record::Record;
use crate::core::store::{RecordStore, ScopedFilter};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::ErrorKind;
use serde::de::DeserializeOwned;

const BACKEND: &str = "mongodb";

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a BSON Document back into a serde_json::Value,
/// renaming `_id` → `id` for domain record convention.
///
/// Stored dates become RFC 3339 strings again, the form records deserialize from.
fn document_to_json(mut doc: Document) -> serde_json::Value {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    for (_, value) in doc.iter_mut() {
        let restored = match value {
            Bson::DateTime(stored) => DateTime::<Utc>::from_timestamp_millis(stored.timestamp_millis()),
            _ => None,
        };
        if let Some(ts) = restored {
            *value = Bson::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true));
        }
    }

    Bson::Document(doc).into_relaxed_extjson()
}

/// Convert a record into the document stored for it
///
/// Every top-level field the record reports as a timestamp is written as a
/// BSON date, and `id` becomes `_id`.
fn record_to_document<T: Record>(record: &T) -> Result<Document, StorageError> {
    let encode_error = |message: String| StorageError::QueryFailed {
        backend: BACKEND.to_string(),
        message: format!("failed to encode {}: {}", T::resource_name_singular(), message),
    };

    let json = serde_json::to_value(record).map_err(|e| encode_error(e.to_string()))?;
    let mut doc = match mongodb::bson::to_bson(&json).map_err(|e| encode_error(e.to_string()))? {
        Bson::Document(doc) => doc,
        other => return Err(encode_error(format!("expected an object, got {}", other))),
    };

    for (key, value) in doc.iter_mut() {
        if let Some(FieldValue::DateTime(ts)) = record.field_value(key) {
            *value = datetime_bson(&ts);
        }
    }

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

fn datetime_bson(ts: &DateTime<Utc>) -> Bson {
    Bson::DateTime(mongodb::bson::DateTime::from_millis(ts.timestamp_millis()))
}

/// Store field name for a record field path
fn field_name(field: &str) -> &str {
    if field == ID_FIELD { "_id" } else { field }
}

/// Convert a field value to the BSON stored for it
fn value_bson(value: &FieldValue) -> Bson {
    match value {
        FieldValue::String(s) => Bson::String(s.clone()),
        FieldValue::Integer(i) => Bson::Int64(*i),
        FieldValue::Float(f) => Bson::Double(*f),
        FieldValue::Boolean(b) => Bson::Boolean(*b),
        FieldValue::Uuid(id) => Bson::String(id.to_string()),
        FieldValue::DateTime(ts) => datetime_bson(ts),
        FieldValue::Null => Bson::Null,
    }
}

/// Translate a predicate into a MongoDB filter document
fn predicate_to_document(predicate: &Predicate) -> Document {
    match predicate {
        Predicate::Always => Document::new(),
        Predicate::Never => doc! { "_id": { "$in": [] } },
        Predicate::Compare { field, op, value } => {
            let value = value_bson(value);
            let condition = match op {
                CompareOp::Eq => value,
                CompareOp::Gte => Bson::Document(doc! { "$gte": value }),
                CompareOp::Lte => Bson::Document(doc! { "$lte": value }),
            };
            let mut doc = Document::new();
            doc.insert(field_name(field), condition);
            doc
        }
        Predicate::In { field, values } => {
            let values: Vec<Bson> = values.iter().map(value_bson).collect();
            let mut doc = Document::new();
            doc.insert(field_name(field), doc! { "$in": values });
            doc
        }
        Predicate::And(children) => {
            let children: Vec<Document> = children.iter().map(predicate_to_document).collect();
            doc! { "$and": children }
        }
    }
}

/// Translate sort keys into a MongoDB sort document
fn sort_to_document(sort: &[SortKey]) -> Document {
    let mut doc = Document::new();
    for key in sort {
        let direction = match key.direction {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        };
        doc.insert(field_name(&key.field), direction);
    }
    doc
}

fn storage_error(error: mongodb::error::Error) -> StorageError {
    match *error.kind {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => StorageError::Unavailable {
            backend: BACKEND.to_string(),
            message: error.to_string(),
        },
        _ => StorageError::QueryFailed {
            backend: BACKEND.to_string(),
            message: error.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// MongoStore<T>
// ---------------------------------------------------------------------------

/// Record store backed by MongoDB.
///
/// # Example
///
/// ```rust,ignore
/// use mongodb::Client;
/// use listq::storage::MongoStore;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let store = MongoStore::<Flight>::new(client.database("records"));
/// let repository = Repository::new(Arc::new(store), Arc::new(flight_filters()?));
/// ```
#[derive(Clone, Debug)]
pub struct MongoStore<T> {
    database: Database,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> MongoStore<T> {
    /// Create a new `MongoStore` with the given database handle.
    pub fn new(database: Database) -> Self {
        Self {
            database,
            _marker: std::marker::PhantomData,
        }
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl<T: Record + DeserializeOwned> MongoStore<T> {
    /// Store one record
    pub async fn insert(&self, record: &T) -> Result<(), StorageError> {
        self.collection()
            .insert_one(record_to_document(record)?)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    /// Store several records in one round-trip
    pub async fn insert_many(&self, records: &[T]) -> Result<(), StorageError> {
        if records.is_empty() {
            return Ok(());
        }
        let docs = records
            .iter()
            .map(record_to_document)
            .collect::<Result<Vec<_>, _>>()?;
        self.collection()
            .insert_many(docs)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}

impl<T: Record + DeserializeOwned> MongoStore<T> {
    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(T::resource_name())
    }

    fn document_to_record(doc: Document) -> Result<T, StorageError> {
        serde_json::from_value(document_to_json(doc)).map_err(|e| StorageError::Decode {
            backend: BACKEND.to_string(),
            message: e.to_string(),
        })
    }

    fn filter_document(filter: &ScopedFilter) -> Document {
        predicate_to_document(&filter.to_predicate())
    }

    /// Order used when a single record is picked: oldest first
    fn first_match_sort() -> Document {
        doc! { "created_at": 1, "_id": 1 }
    }
}

#[async_trait]
impl<T: Record + DeserializeOwned> RecordStore<T> for MongoStore<T> {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn count(&self, filter: &ScopedFilter) -> Result<u64, StorageError> {
        self.collection()
            .count_documents(Self::filter_document(filter))
            .await
            .map_err(storage_error)
    }

    async fn find(
        &self,
        filter: &ScopedFilter,
        sort: &[SortKey],
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>, StorageError> {
        let cursor = self
            .collection()
            .find(Self::filter_document(filter))
            .sort(sort_to_document(sort))
            .skip(skip)
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await
            .map_err(storage_error)?;

        let docs: Vec<Document> = cursor.try_collect().await.map_err(storage_error)?;

        docs.into_iter().map(Self::document_to_record).collect()
    }

    async fn find_one(&self, filter: &ScopedFilter) -> Result<Option<T>, StorageError> {
        let doc = self
            .collection()
            .find_one(Self::filter_document(filter))
            .sort(Self::first_match_sort())
            .await
            .map_err(storage_error)?;

        doc.map(Self::document_to_record).transpose()
    }

    async fn delete_one(&self, filter: &ScopedFilter) -> Result<Option<T>, StorageError> {
        let doc = self
            .collection()
            .find_one_and_delete(Self::filter_document(filter))
            .sort(Self::first_match_sort())
            .await
            .map_err(storage_error)?;

        doc.map(Self::document_to_record).transpose()
    }

    async fn replace_one(&self, filter: &ScopedFilter, record: &T) -> Result<bool, StorageError> {
        let result = self
            .collection()
            .replace_one(Self::filter_document(filter), record_to_document(record)?)
            .await
            .map_err(storage_error)?;

        Ok(result.matched_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tenant::TenantId;
    use crate::entities::Flight;
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn document_to_json_renames_underscore_id_to_id() {
        let doc = doc! { "_id": "abc", "designation": "N123" };
        let json = document_to_json(doc);

        assert_eq!(json["id"], "abc");
        assert_eq!(json["designation"], "N123");
        assert!(json.get("_id").is_none(), "json should not contain _id");
    }

    #[test]
    fn id_field_maps_to_underscore_id() {
        let id = Uuid::new_v4();
        let doc = predicate_to_document(&Predicate::eq(ID_FIELD, id));
        assert_eq!(doc.get_str("_id").unwrap(), id.to_string());
    }

    #[test]
    fn never_matches_nothing() {
        let doc = predicate_to_document(&Predicate::Never);
        let inner = doc.get_document("_id").unwrap();
        assert!(inner.get_array("$in").unwrap().is_empty());
    }

    #[test]
    fn scoped_filter_puts_tenant_first() {
        let tenant = TenantId::from(Uuid::new_v4());
        let filter = ScopedFilter::new(
            tenant,
            Predicate::and([
                Predicate::one_of("departure_airport", vec!["KJFK".into(), "KBOS".into()]),
                Predicate::gte("score", 50i64),
            ]),
        );

        let doc = predicate_to_document(&filter.to_predicate());
        let clauses = doc.get_array("$and").unwrap();
        assert_eq!(clauses.len(), 3);
        assert_eq!(
            clauses[0],
            Bson::Document(doc! { "tenant_id": tenant.to_string() })
        );
        assert_eq!(
            clauses[1],
            Bson::Document(doc! { "departure_airport": { "$in": ["KJFK", "KBOS"] } })
        );
        assert_eq!(
            clauses[2],
            Bson::Document(doc! { "score": { "$gte": 50i64 } })
        );
    }

    #[test]
    fn date_bounds_are_bson_dates() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(999);
        let doc = predicate_to_document(&Predicate::lte("flight_date", ts));
        let bound = doc.get_document("flight_date").unwrap().get_datetime("$lte").unwrap();
        assert_eq!(bound.timestamp_millis(), ts.timestamp_millis());
    }

    #[test]
    fn record_dates_are_stored_as_bson_dates() {
        let tenant = TenantId::from(Uuid::new_v4());
        let flown = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()
            + chrono::Duration::milliseconds(500);
        let flight = Flight::new(
            tenant,
            Uuid::new_v4(),
            flown,
            Some("KBOS".to_string()),
            None,
            Uuid::new_v4(),
            None,
            Uuid::new_v4(),
            None,
            None,
            None,
            Default::default(),
        )
        .with_tag("customId", "A_1");

        let doc = record_to_document(&flight).unwrap();
        assert_eq!(doc.get_str("_id").unwrap(), flight.id.to_string());
        assert!(doc.get("id").is_none());
        assert_eq!(doc.get_str("tenant_id").unwrap(), tenant.to_string());
        assert_eq!(
            doc.get_datetime("flight_date").unwrap().timestamp_millis(),
            flown.timestamp_millis()
        );
        assert!(doc.get_datetime("created_at").is_ok());
        assert_eq!(doc.get_document("tag").unwrap().get_str("customId").unwrap(), "A_1");

        let restored: Flight = serde_json::from_value(document_to_json(doc)).unwrap();
        assert_eq!(restored.flight_date, flown);
        assert_eq!(restored.id, flight.id);
    }

    #[test]
    fn nested_tag_fields_stay_dotted() {
        let doc = predicate_to_document(&Predicate::eq("tag.customId", "A-1"));
        assert_eq!(doc.get_str("tag.customId").unwrap(), "A-1");
    }

    #[test]
    fn sort_document_keeps_order() {
        let doc = sort_to_document(&[SortKey::desc("created_at"), SortKey::asc(ID_FIELD)]);
        let keys: Vec<&String> = doc.keys().collect();
        assert_eq!(keys, vec!["created_at", "_id"]);
        assert_eq!(doc.get_i32("created_at").unwrap(), -1);
        assert_eq!(doc.get_i32("_id").unwrap(), 1);
    }
}
