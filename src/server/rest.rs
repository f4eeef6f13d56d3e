//! REST routes over a repository
//!
//! For a record type with resource name `flights` this exposes:
//!
//! - `GET /flights` - paginated, filtered list (`{data, meta}`)
//! - `GET /flights/{token}` - one record by id or `tag.<name>:<value>`
//! - `DELETE /flights/{token}` - delete one record (204)
//! - `POST /flights/batch-delete` - delete several records one at a time
//!
//! `batch-delete` is a static segment and wins over `{token}`: `GET` or
//! `DELETE /flights/batch-delete` answer 405 instead of looking up a record
//! with that id. Record ids are UUIDs and tags start with `tag.`, so no real
//! record is addressed this way.
//!
//! Assessments are served by [`assessment_routes`]: same list and get routes,
//! but `DELETE` retires the assessment instead of removing it, and there is no
//! batch delete.
//!
//! The tenant always comes from the [`AuthContext`] extension installed by the
//! authentication layer; requests without one are rejected with 401.

use crate::core::auth::AuthContext;
use crate::core::error::{EngineError, EngineResult, RequestError};
use crate::core::query::{ListQuery, Page, RawParams};
use crate::core::record::Record;
use crate::core::repository::{BatchOutcome, Repository};
use crate::core::store::RecordStore;
use crate::core::tenant::TenantId;
use crate::entities::assessment::{Assessment, retire_assessment};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Build the routes of one record type
pub fn entity_routes<T, S>(repository: Repository<T, S>) -> Router
where
    T: Record,
    S: RecordStore<T> + 'static,
{
    let collection = format!("/{}", T::resource_name());
    let item = format!("/{}/{{token}}", T::resource_name());
    let batch = format!("/{}/batch-delete", T::resource_name());

    Router::new()
        .route(&collection, get(list_records::<T, S>))
        .route(&batch, post(batch_delete::<T, S>))
        .route(
            &item,
            get(get_record::<T, S>).delete(delete_record::<T, S>),
        )
        .with_state(repository)
}

/// Build the routes of assessments
pub fn assessment_routes<S>(repository: Repository<Assessment, S>) -> Router
where
    S: RecordStore<Assessment> + 'static,
{
    let collection = format!("/{}", Assessment::resource_name());
    let item = format!("/{}/{{token}}", Assessment::resource_name());

    Router::new()
        .route(&collection, get(list_records::<Assessment, S>))
        .route(
            &item,
            get(get_record::<Assessment, S>).delete(retire_record::<S>),
        )
        .with_state(repository)
}

fn tenant_of(auth: Option<Extension<AuthContext>>) -> EngineResult<TenantId> {
    let Some(Extension(context)) = auth else {
        return Err(RequestError::MissingTenant.into());
    };
    Ok(context.require_tenant()?)
}

/// GET /{plural}
async fn list_records<T, S>(
    State(repository): State<Repository<T, S>>,
    auth: Option<Extension<AuthContext>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> EngineResult<Json<Page<T>>>
where
    T: Record,
    S: RecordStore<T> + 'static,
{
    let tenant_id = tenant_of(auth)?;
    let query = ListQuery::parse(
        RawParams::from_pairs(pairs),
        tenant_id,
        &repository.settings().pagination,
    )?;

    Ok(Json(repository.find_with_params(&query).await?))
}

/// GET /{plural}/{token}
async fn get_record<T, S>(
    State(repository): State<Repository<T, S>>,
    auth: Option<Extension<AuthContext>>,
    Path(token): Path<String>,
) -> EngineResult<Json<T>>
where
    T: Record,
    S: RecordStore<T> + 'static,
{
    let tenant_id = tenant_of(auth)?;

    match repository.resolve_one(&token, &tenant_id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(not_found::<T>(token)),
    }
}

/// DELETE /{plural}/{token}
async fn delete_record<T, S>(
    State(repository): State<Repository<T, S>>,
    auth: Option<Extension<AuthContext>>,
    Path(token): Path<String>,
) -> EngineResult<StatusCode>
where
    T: Record,
    S: RecordStore<T> + 'static,
{
    let tenant_id = tenant_of(auth)?;

    match repository.delete_one(&token, &tenant_id).await? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(not_found::<T>(token)),
    }
}

/// DELETE /assessments/{token}
async fn retire_record<S>(
    State(repository): State<Repository<Assessment, S>>,
    auth: Option<Extension<AuthContext>>,
    Path(token): Path<String>,
) -> EngineResult<StatusCode>
where
    S: RecordStore<Assessment> + 'static,
{
    let tenant_id = tenant_of(auth)?;

    match retire_assessment(&repository, &token, &tenant_id).await? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(not_found::<Assessment>(token)),
    }
}

fn not_found<T: Record>(token: String) -> EngineError {
    EngineError::NotFound {
        entity_type: T::resource_name_singular().to_string(),
        token,
    }
}

/// Body of `POST /{plural}/batch-delete`
#[derive(Debug, Deserialize)]
pub struct BatchDeleteRequest {
    pub ids: Vec<String>,
}

/// Failure that stopped a batch
#[derive(Debug, Serialize)]
pub struct BatchFailure {
    pub token: String,
    pub code: String,
    pub message: String,
}

/// Response of `POST /{plural}/batch-delete`
#[derive(Debug, Serialize)]
pub struct BatchDeleteResponse {
    /// Ids of the deleted records
    pub deleted: Vec<Uuid>,
    pub not_found: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<BatchFailure>,
    pub skipped: Vec<String>,
}

impl<T: Record> From<BatchOutcome<T>> for BatchDeleteResponse {
    fn from(outcome: BatchOutcome<T>) -> Self {
        Self {
            deleted: outcome.succeeded.iter().map(Record::id).collect(),
            not_found: outcome.not_found,
            failed: outcome.failed.map(|(token, error)| BatchFailure {
                token,
                code: error.error_code().to_string(),
                message: error.to_string(),
            }),
            skipped: outcome.skipped,
        }
    }
}

/// POST /{plural}/batch-delete
///
/// Answers 200 when every token was processed, otherwise the status of the
/// store failure that stopped the batch, with the partial outcome as body.
async fn batch_delete<T, S>(
    State(repository): State<Repository<T, S>>,
    auth: Option<Extension<AuthContext>>,
    Json(request): Json<BatchDeleteRequest>,
) -> EngineResult<Response>
where
    T: Record,
    S: RecordStore<T> + 'static,
{
    let tenant_id = tenant_of(auth)?;
    let outcome = repository.delete_each(request.ids.as_slice(), &tenant_id).await?;

    let status = match &outcome.failed {
        Some((_, error)) => error.status_code(),
        None => StatusCode::OK,
    };
    let body = BatchDeleteResponse::from(outcome);
    Ok((status, Json(body)).into_response())
}
