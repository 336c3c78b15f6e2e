//! HTTP handlers for the resource endpoints.
//!
//! The handlers are generic over the record kind; `routes` instantiates them
//! once per kind. Each handler maps the request onto one repository call and
//! the outcome onto a status code.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::domain::Entity;
use crate::infrastructure::{EntityRepository, KeyValueStore};

use super::dto::{DeleteResponse, HealthResponse, ListQuery};
use super::error::ApiErrorResponse;
use super::extract::{JsonBody, QueryParams};

// =============================================================================
// Application State
// =============================================================================

/// Shared state: the process-wide store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Repository for one record kind over the shared store.
    #[must_use]
    pub fn repository<E: Entity>(&self) -> EntityRepository<E> {
        EntityRepository::new(Arc::clone(&self.store))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("AppState").finish_non_exhaustive()
    }
}

// =============================================================================
// Resource Handlers
// =============================================================================

/// `POST /{collection}`: stores a new record.
///
/// # Errors
///
/// 400 on a duplicate key or unknown reference, 422 on an invalid body.
pub async fn create_entity<E: Entity>(
    State(state): State<AppState>,
    JsonBody(record): JsonBody<E>,
) -> Result<(StatusCode, Json<E>), ApiErrorResponse> {
    let created = state.repository::<E>().create(record).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /{collection}`: lists records, optionally filtered and paged.
///
/// # Errors
///
/// 422 on invalid query parameters, 500 when the store is unavailable.
pub async fn list_entities<E: Entity>(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<Vec<E>>, ApiErrorResponse> {
    let (filter, pagination) = query.into_parts();
    let records = state.repository::<E>().list_all(&filter, pagination).await?;
    Ok(Json(records))
}

/// `GET /{collection}/{key}`: fetches one record.
///
/// # Errors
///
/// 404 when absent, 500 when the stored record is corrupt.
pub async fn get_entity<E: Entity>(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<E>, ApiErrorResponse> {
    let record = state.repository::<E>().get_by_id(&key).await?;
    Ok(Json(record))
}

/// `PUT /{collection}/{key}`: merges the supplied fields into the record.
///
/// # Errors
///
/// 404 when absent, 400 on an unknown reference, 422 on an invalid body.
pub async fn update_entity<E: Entity>(
    State(state): State<AppState>,
    Path(key): Path<String>,
    JsonBody(patch): JsonBody<E::Patch>,
) -> Result<(StatusCode, Json<E>), ApiErrorResponse> {
    let updated = state.repository::<E>().update(&key, patch).await?;
    Ok((StatusCode::ACCEPTED, Json(updated)))
}

/// `DELETE /{collection}/{key}`: removes the record.
///
/// # Errors
///
/// 404 when absent.
pub async fn delete_entity<E: Entity>(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>, ApiErrorResponse> {
    let key = state.repository::<E>().delete(&key).await?;
    Ok(Json(DeleteResponse {
        kind: E::KIND.collection().to_string(),
        key,
    }))
}

/// `GET /health`.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Tests
// =============================================================================
