//! Estante Server Library
//!
//! A self-hosted personal PDF library: fetches PDFs from plain URLs or arXiv
//! abstract pages, keeps metadata in one flat JSON document, renders
//! best-effort first-page thumbnails and exposes CRUD, search and annotation
//! endpoints. The server binary is in main.rs; the router is assembled here
//! so integration tests can drive the real application.
//!
//! # Modules
//!
//! - `store`: the flat-file JSON metadata store
//! - `ingest`: the fetch -> persist -> thumbnail -> append pipelines
//! - `arxiv`: abstract-page metadata extraction
//! - `thumbnail`: best-effort first-page PNG rendering

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod arxiv;
pub mod config;
pub mod error;
pub mod ingest;
pub mod routes;
pub mod state;
pub mod store;
pub mod thumbnail;

use state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(routes::ingest::router())
        .nest("/pdfs", routes::pdfs::router())
        .nest("/thumbnails", routes::thumbnails::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
