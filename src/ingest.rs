//! PDF ingestion pipelines
//!
//! Two entry points share one tail: fetch bytes, write `<id>.pdf`, try a
//! thumbnail, append the record to the store. A failed fetch aborts before
//! anything touches the filesystem or the store, so no partial record is ever
//! visible. There are no retries.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::arxiv::{self, ArxivMetadata};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::PdfRecord;
use crate::thumbnail::{self, ThumbnailOutcome};

/// What an ingestion endpoint returns to the client.
#[derive(Debug, Serialize)]
pub struct IngestReceipt {
    pub message: String,
    pub id: String,
}

/// Ingest a PDF from a plain URL. Metadata fields stay empty.
pub async fn download(state: &AppState, url: &str) -> Result<IngestReceipt> {
    let response = state.http().get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream {
            status: status.as_u16(),
            detail: format!(
                "HTTP error downloading PDF: {} - {}",
                status.as_u16(),
                body
            ),
        });
    }
    let bytes = response.bytes().await?;

    let filename = filename_from_url(url);
    let record = persist(state, &bytes, filename, url.to_string(), None).await?;

    Ok(IngestReceipt {
        message: format!("PDF '{}' downloaded successfully!", record.filename),
        id: record.id,
    })
}

/// Ingest a PDF via its arXiv abstract page, scraping metadata on the way.
pub async fn download_arxiv(state: &AppState, abstract_url: &str) -> Result<IngestReceipt> {
    let base_url = &state.config().arxiv.base_url;
    if !arxiv::is_abstract_url(abstract_url, base_url) {
        return Err(AppError::BadRequest(format!(
            "Invalid arXiv abstract URL. Must start with {}",
            arxiv::abstract_url_prefix(base_url)
        )));
    }

    let response = state.http().get(abstract_url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream {
            status: status.as_u16(),
            detail: format!("HTTP error: {} - {}", status.as_u16(), body),
        });
    }
    let html = response.text().await?;
    let meta = arxiv::extract_metadata(&html);

    // The record stores the concrete PDF URL, not the abstract page.
    let pdf_url = arxiv::pdf_url(abstract_url);
    let pdf_response = state.http().get(&pdf_url).send().await?;
    let pdf_status = pdf_response.status();
    if !pdf_status.is_success() {
        let body = pdf_response.text().await.unwrap_or_default();
        return Err(AppError::Upstream {
            status: pdf_status.as_u16(),
            detail: format!("HTTP error: {} - {}", pdf_status.as_u16(), body),
        });
    }
    let bytes = pdf_response.bytes().await?;

    let filename = format!("{}.pdf", arxiv::sanitize_title(&meta.title));
    let title = meta.title.clone();
    let record = persist(state, &bytes, filename, pdf_url, Some(meta)).await?;

    Ok(IngestReceipt {
        message: format!("ArXiv PDF '{}' downloaded successfully!", title),
        id: record.id,
    })
}

/// Shared pipeline tail: write the file, try a thumbnail, append the record.
/// The file is on disk before the store ever sees the record.
async fn persist(
    state: &AppState,
    bytes: &[u8],
    filename: String,
    source_url: String,
    meta: Option<ArxivMetadata>,
) -> Result<PdfRecord> {
    let id = Uuid::new_v4().to_string();
    let pdf_path = state.config().pdf_path(&id);
    tokio::fs::write(&pdf_path, bytes).await?;

    let thumbnail_url =
        match thumbnail::generate(&pdf_path, &id, &state.config().library.thumbnails_dir).await {
            ThumbnailOutcome::Generated(url) => Some(url),
            ThumbnailOutcome::Skipped(_) => None,
        };

    let (title, authors, abstract_text, publication_date) = match meta {
        Some(m) => (
            Some(m.title),
            Some(m.authors),
            Some(m.abstract_text),
            Some(m.publication_date),
        ),
        None => (None, None, None, None),
    };

    let record = PdfRecord {
        id,
        filename,
        url: source_url,
        download_date: Utc::now(),
        title,
        authors,
        abstract_text,
        publication_date,
        thumbnail_url,
        annotations: Vec::new(),
        drawings: Vec::new(),
    };

    let mut records = state.store().load().await?;
    records.push(record.clone());
    state.store().save(&records).await?;

    Ok(record)
}

/// Display name for a plain download: the final URL path segment with query
/// and fragment stripped, or a generated placeholder when that is not a
/// usable PDF name.
fn filename_from_url(url: &str) -> String {
    let trimmed = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .rsplit('/')
        .next()
        .unwrap_or_default();

    if trimmed.is_empty() || !trimmed.to_lowercase().ends_with(".pdf") {
        format!("downloaded_pdf_{}.pdf", Uuid::new_v4().simple())
    } else {
        trimmed.to_string()
    }
}
