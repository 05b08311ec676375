//! Thumbnail serving

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the thumbnails router (mounted at `/thumbnails`)
pub fn router() -> Router<AppState> {
    Router::new().route("/:name", get(serve_thumbnail))
}

async fn serve_thumbnail(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response> {
    // Names are always `<uuid>.png`; anything that could escape the
    // thumbnail directory is treated as absent.
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(AppError::NotFound("Thumbnail not found".to_string()));
    }

    let path = state.config().library.thumbnails_dir.join(&name);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| AppError::NotFound("Thumbnail not found".to_string()))?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(e.to_string()))?)
}
