use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use docreg_types::{ContentHash, DocumentRecord};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Header carrying the hex content hash of served bytes.
pub const CONTENT_HASH_HEADER: &str = "x-content-hash";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub owner: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SupplyResponse {
    pub total_supply: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddResponse {
    pub address: String,
    pub object_id: String,
    pub content_hash: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub content_hash: String,
    pub name_hash: String,
    pub name: String,
    pub owner: String,
}

impl From<DocumentRecord> for DocumentResponse {
    fn from(record: DocumentRecord) -> Self {
        Self {
            content_hash: record.content_hash.to_hex(),
            name_hash: record.name_hash.to_hex(),
            name: record.name,
            owner: record.owner.to_hex(),
        }
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        owner: state.owner().to_hex(),
    })
}

pub async fn supply(State(state): State<AppState>) -> ServerResult<Json<SupplyResponse>> {
    let total_supply = state.registry.total_supply().await?;
    Ok(Json(SupplyResponse { total_supply }))
}

pub async fn put_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<AddResponse>)> {
    let address = state.registry.add(state.owner(), &filename, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(AddResponse {
            address: address.to_string(),
            object_id: address.object_id.to_hex(),
            content_hash: address.content_hash.to_hex(),
            name: filename,
        }),
    ))
}

pub async fn get_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ServerResult<Response> {
    let doc = state.registry.read_by_name(&state.owner(), &filename).await?;

    let disposition = format!("attachment; filename=\"{}\"", filename.replace(['"', '\\'], "_"));
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| ServerError::BadRequest(format!("unrepresentable filename: {e}")))?;
    let hash = HeaderValue::from_str(&doc.address.content_hash.to_hex())
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (header::CONTENT_DISPOSITION, disposition),
            (header::HeaderName::from_static(CONTENT_HASH_HEADER), hash),
        ],
        doc.content,
    )
        .into_response())
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ServerResult<Json<DocumentResponse>> {
    let removed = state.registry.delete_by_name(state.key(), &filename).await?;
    Ok(Json(removed.into()))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(content_hash): Path<String>,
) -> ServerResult<Json<DocumentResponse>> {
    let hash = ContentHash::from_hex(&content_hash)
        .map_err(|e| ServerError::BadRequest(format!("content hash: {e}")))?;
    let record = state.registry.get(&hash).await?;
    Ok(Json(record.into()))
}
