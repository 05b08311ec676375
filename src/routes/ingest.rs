//! Ingestion endpoints
//!
//! `POST /download-pdf` and `POST /download-arxiv-pdf`. The actual pipelines
//! live in [`crate::ingest`]; these handlers only deserialize the request and
//! hand the receipt back.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::error::Result;
use crate::ingest::{self, IngestReceipt};
use crate::state::AppState;

/// Create the ingestion router (mounted at the application root)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/download-pdf", post(download_pdf))
        .route("/download-arxiv-pdf", post(download_arxiv_pdf))
}

#[derive(Debug, Deserialize)]
struct DownloadRequest {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ArxivDownloadRequest {
    arxiv_url: String,
}

async fn download_pdf(
    State(state): State<AppState>,
    Json(req): Json<DownloadRequest>,
) -> Result<Json<IngestReceipt>> {
    let receipt = ingest::download(&state, &req.url).await?;
    Ok(Json(receipt))
}

async fn download_arxiv_pdf(
    State(state): State<AppState>,
    Json(req): Json<ArxivDownloadRequest>,
) -> Result<Json<IngestReceipt>> {
    let receipt = ingest::download_arxiv(&state, &req.arxiv_url).await?;
    Ok(Json(receipt))
}
