//! HTTP handlers: the thin adapter translating method + path + query +
//! JSON body into a single engine call, then formatting the result.
//!
//! Every handler buffers its whole body via axum's `Json` extractor
//! before touching the store, so there is never a partial-body engine
//! call (see the design notes on connection-state lifetime).

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppState;
use crate::errors::ServerError;
use vector_similarity::{DistanceFn, LinearAlgorithm};

#[derive(Deserialize)]
pub struct VectorQuery {
    index: Option<usize>,
    uuid: Option<String>,
}

#[derive(Deserialize)]
pub struct IndexQuery {
    index: usize,
}

#[derive(Deserialize)]
pub struct CompareQuery {
    index1: usize,
    index2: usize,
}

#[derive(Deserialize)]
pub struct InsertBody {
    uuid: Option<String>,
    vector: Vec<f64>,
}

#[derive(Serialize)]
pub struct VectorResponse {
    index: usize,
    uuid: String,
    vector: Vec<f64>,
}

#[derive(Serialize)]
pub struct InsertResponse {
    index: usize,
}

#[derive(Serialize)]
pub struct CompareResponse {
    result: f64,
}

pub async fn health() -> &'static str {
    "ok"
}

#[tracing::instrument(skip(state))]
pub async fn get_vector(
    State(state): State<AppState>,
    Query(query): Query<VectorQuery>,
) -> Result<Json<VectorResponse>, ServerError> {
    let (index, record) = match (query.index, query.uuid) {
        (Some(index), _) => (index, state.store.read(index)?),
        (None, Some(uuid)) => {
            let uuid = parse_uuid(&uuid)?;
            state.store.read_by_uuid(uuid)?
        }
        (None, None) => return Err(ServerError::MissingParameter("index or uuid")),
    };
    Ok(Json(VectorResponse {
        index,
        uuid: record.uuid.to_string(),
        vector: record.payload,
    }))
}

#[tracing::instrument(skip(state, body))]
pub async fn insert_vector(
    State(state): State<AppState>,
    Json(body): Json<InsertBody>,
) -> Result<Json<InsertResponse>, ServerError> {
    let uuid = match body.uuid {
        Some(raw) => parse_uuid(&raw)?,
        None => Uuid::new_v4(),
    };
    let index = state.store.insert(uuid, body.vector)?;
    Ok(Json(InsertResponse { index }))
}

#[tracing::instrument(skip(state, body))]
pub async fn update_vector(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
    Json(body): Json<Vec<f64>>,
) -> Result<(), ServerError> {
    state.store.update(query.index, body)
}

#[tracing::instrument(skip(state))]
pub async fn delete_vector(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<(), ServerError> {
    state.store.delete(query.index)?;
    Ok(())
}

#[tracing::instrument(skip(state))]
pub async fn compare_cosine_similarity(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<CompareResponse>, ServerError> {
    compare(&state, query, LinearAlgorithm::CosineSimilarity)
}

#[tracing::instrument(skip(state))]
pub async fn compare_euclidean_distance(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<CompareResponse>, ServerError> {
    compare(&state, query, LinearAlgorithm::EuclideanDistance)
}

#[tracing::instrument(skip(state))]
pub async fn compare_dot_product(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<CompareResponse>, ServerError> {
    compare(&state, query, LinearAlgorithm::DotProductSimilarity)
}

fn compare(
    state: &AppState,
    query: CompareQuery,
    algorithm: LinearAlgorithm,
) -> Result<Json<CompareResponse>, ServerError> {
    let first = state.store.read(query.index1)?;
    let second = state.store.read(query.index2)?;
    let a: Vec<f32> = first.payload.iter().map(|v| *v as f32).collect();
    let b: Vec<f32> = second.payload.iter().map(|v| *v as f32).collect();
    let kernel: DistanceFn = algorithm.into();
    let result = kernel(&a, &b);
    if result == vector_similarity::distance::DIMENSION_MISMATCH_SENTINEL && a.len() != b.len() {
        return Err(ServerError::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(Json(CompareResponse {
        result: result as f64,
    }))
}

#[tracing::instrument(skip(state, body))]
pub async fn nearest(
    State(state): State<AppState>,
    Json(body): Json<Vec<f64>>,
) -> Result<Json<VectorResponse>, ServerError> {
    let (index, record) = state.store.nearest(body)?;
    Ok(Json(VectorResponse {
        index,
        uuid: record.uuid.to_string(),
        vector: record.payload,
    }))
}

fn parse_uuid(raw: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(raw).map_err(|e| ServerError::MalformedRequest(format!("invalid uuid: {e}")))
}
