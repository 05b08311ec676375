//! PDF record endpoints
//!
//! List/search, fetch, serve, delete and annotation persistence. Every
//! handler loads the store fresh, mutates in memory and saves the whole list
//! back; insertion order is never re-sorted.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::routes::MessageResponse;
use crate::state::AppState;
use crate::store::PdfRecord;

/// Create the pdfs router (mounted at `/pdfs`)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pdfs))
        .route("/:id", get(get_pdf).delete(delete_pdf))
        .route("/serve/:id", get(serve_pdf))
        .route("/:id/annotations", post(save_annotations))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    query: Option<String>,
}

/// List all records, optionally filtered by a case-insensitive substring
/// match against title, abstract and authors.
async fn list_pdfs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PdfRecord>>> {
    let records = state.store().load().await?;

    let records = match params.query.as_deref().filter(|q| !q.is_empty()) {
        Some(query) => records
            .into_iter()
            .filter(|r| r.matches_query(query))
            .collect(),
        None => records,
    };

    Ok(Json(records))
}

async fn get_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PdfRecord>> {
    let records = state.store().load().await?;
    let record = records
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| AppError::NotFound("PDF not found".to_string()))?;
    Ok(Json(record))
}

/// Serve the stored PDF bytes. A missing record and a record whose file has
/// gone missing are distinct causes with the same 404 status.
async fn serve_pdf(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let records = state.store().load().await?;
    let record = records
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| AppError::NotFound("PDF not found".to_string()))?;

    let path = state.config().pdf_path(&record.id);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| AppError::NotFound("PDF file not found on server".to_string()))?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", record.filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(e.to_string()))?)
}

/// Delete a record and its stored PDF. The thumbnail file is left behind; the
/// source never cleaned it up and callers depend on ids, not leftovers.
async fn delete_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let mut records = state.store().load().await?;
    let initial_len = records.len();
    records.retain(|r| r.id != id);

    if records.len() == initial_len {
        return Err(AppError::NotFound("PDF not found".to_string()));
    }

    state.store().save(&records).await?;

    let path = state.config().pdf_path(&id);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(pdf_id = %id, "Failed to remove PDF file: {}", e);
        }
    }

    Ok(Json(MessageResponse {
        message: "PDF deleted successfully".to_string(),
    }))
}

/// Elements must be JSON objects; their shape is otherwise opaque.
/// Non-object elements are rejected at deserialization with a 422.
#[derive(Debug, Deserialize)]
struct AnnotationsRequest {
    annotations: Vec<Map<String, Value>>,
    drawings: Vec<Map<String, Value>>,
}

/// Wholesale-replace the annotations and drawings of one record. The
/// payloads are opaque JSON documents; the store never inspects them.
async fn save_annotations(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AnnotationsRequest>,
) -> Result<Json<MessageResponse>> {
    let mut records = state.store().load().await?;
    let record = records
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| AppError::NotFound("PDF not found".to_string()))?;

    record.annotations = req.annotations.into_iter().map(Value::Object).collect();
    record.drawings = req.drawings.into_iter().map(Value::Object).collect();
    state.store().save(&records).await?;

    Ok(Json(MessageResponse {
        message: "Annotations saved successfully".to_string(),
    }))
}
