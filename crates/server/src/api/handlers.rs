//! HTTP request handlers and shared application state.

use crate::api::errors::ApiError;
use crate::api::models::{MetadataPatch, SearchRequest, TextResponse};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use shardvec_core::config;
use shardvec_core::index::VectorIndex;
use shardvec_core::record::{Object, Vector};
use shardvec_core::storage::ShardedStorage;
use std::sync::Arc;

/// Shared application state passed to every handler via Axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<ShardedStorage>,
    pub index: Arc<VectorIndex>,
}

fn validate_embedding(embedding: &[f64]) -> Result<(), ApiError> {
    if embedding.len() > config::MAX_DIMENSION {
        return Err(ApiError::BadRequest(format!(
            "embedding exceeds maximum dimension of {}",
            config::MAX_DIMENSION
        )));
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(ApiError::BadRequest(
            "embedding contains NaN or Inf".into(),
        ));
    }
    Ok(())
}

/// `POST /vectors`
pub async fn insert_vector(
    State(state): State<AppState>,
    Json(vector): Json<Vector>,
) -> Result<StatusCode, ApiError> {
    validate_embedding(&vector.embedding)?;
    state.index.insert(vector)?;
    Ok(StatusCode::CREATED)
}

/// `GET /vectors/{id}`
pub async fn get_vector(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vector>, ApiError> {
    Ok(Json(state.storage.get_vector(&id)?))
}

/// `DELETE /vectors/{id}`
pub async fn delete_vector(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.index.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PATCH /vectors/{id}/metadata`
pub async fn patch_vector_metadata(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<MetadataPatch>,
) -> Result<StatusCode, ApiError> {
    state.storage.patch_vector_metadata(&id, &patch.metadata)?;
    Ok(StatusCode::OK)
}

/// `GET /query/{id}`: text projection of a stored vector.
pub async fn query_vector(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TextResponse>, ApiError> {
    let vector = state.storage.get_vector(&id)?;
    Ok(Json(TextResponse { text: vector.text }))
}

/// `POST /search`
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<Vector>>, ApiError> {
    if request.k < 1 {
        return Err(ApiError::BadRequest("k must be at least 1".into()));
    }
    if request.k as usize > config::MAX_K {
        return Err(ApiError::BadRequest(format!(
            "k exceeds maximum of {}",
            config::MAX_K
        )));
    }
    validate_embedding(&request.vector.embedding)?;
    let results = state.index.search(&request.vector, request.k as usize)?;
    Ok(Json(results))
}

/// `POST /objects`, multipart: `data` JSON descriptor + `object` file.
pub async fn insert_object(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<StatusCode, ApiError> {
    let (descriptor, bytes) = read_object_form(multipart).await?;
    let mut object =
        descriptor.ok_or_else(|| ApiError::BadRequest("missing 'data' form field".into()))?;
    object.object =
        bytes.ok_or_else(|| ApiError::BadRequest("missing 'object' form file".into()))?;
    if object.id.is_empty() {
        return Err(ApiError::BadRequest("object id must not be empty".into()));
    }
    state.storage.insert_object(&object)?;
    Ok(StatusCode::CREATED)
}

/// `GET /objects/{id}`
pub async fn get_object(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Object>, ApiError> {
    Ok(Json(state.storage.get_object(&id)?))
}

/// `DELETE /objects/{id}`
pub async fn delete_object(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.storage.delete_object(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PATCH /objects/{id}/metadata`
pub async fn patch_object_metadata(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<MetadataPatch>,
) -> Result<StatusCode, ApiError> {
    state.storage.patch_object_metadata(&id, &patch.metadata)?;
    Ok(StatusCode::OK)
}

/// `PATCH /objects/{id}/content`: multipart `object` file replaces the
/// stored payload; id and metadata are untouched.
pub async fn patch_object_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<StatusCode, ApiError> {
    let (_, bytes) = read_object_form(multipart).await?;
    let bytes =
        bytes.ok_or_else(|| ApiError::BadRequest("missing 'object' form file".into()))?;
    let mut object = state.storage.get_object(&id)?;
    object.object = bytes;
    state.storage.insert_object(&object)?;
    Ok(StatusCode::OK)
}

/// Pulls the `data` JSON descriptor and `object` payload out of a multipart
/// form. Either part may be absent; the callers decide what is required.
async fn read_object_form(
    mut multipart: Multipart,
) -> Result<(Option<Object>, Option<Vec<u8>>), ApiError> {
    let mut descriptor = None;
    let mut bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(format!("failed to parse multipart form: {err}")))?
    {
        match field.name() {
            Some("data") => {
                let text = field.text().await.map_err(|err| {
                    ApiError::BadRequest(format!("unreadable 'data' field: {err}"))
                })?;
                let object: Object = serde_json::from_str(&text)
                    .map_err(|err| ApiError::BadRequest(format!("invalid 'data' JSON: {err}")))?;
                descriptor = Some(object);
            }
            Some("object") => {
                let data = field.bytes().await.map_err(|err| {
                    ApiError::BadRequest(format!("unreadable 'object' field: {err}"))
                })?;
                bytes = Some(data.to_vec());
            }
            _ => continue,
        }
    }
    Ok((descriptor, bytes))
}
