//! Route modules for the Estante server

pub mod health;
pub mod ingest;
pub mod pdfs;
pub mod thumbnails;

use serde::Serialize;

/// Plain `{message}` reply used by delete and annotation saves.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}
