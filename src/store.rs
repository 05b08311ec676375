//! Flat-file metadata store
//!
//! All PDF records live in a single JSON document. Every operation loads the
//! whole list, mutates it in memory and writes the whole list back. There is
//! no coordination between concurrent writers: two overlapping mutations race
//! and the last `save` wins. That is the documented behavior of this
//! single-user service, not something the store papers over with locking.

use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// One entry in the PDF library.
///
/// `id` doubles as the filesystem key: the stored file is `<id>.pdf` and the
/// thumbnail (when generation succeeded) is `<id>.png`. The metadata fields
/// (`title`, `authors`, `abstract_text`, `publication_date`) are populated
/// only for arXiv ingestion and stay `None` for plain URL downloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfRecord {
    pub id: String,
    pub filename: String,
    /// The concrete URL the PDF bytes were fetched from (for arXiv ingestion
    /// this is the derived PDF URL, never the abstract page).
    pub url: String,
    pub download_date: DateTime<Utc>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Option<Vec<String>>,
    #[serde(default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default, deserialize_with = "null_to_empty")]
    pub annotations: Vec<Value>,
    #[serde(default, deserialize_with = "null_to_empty")]
    pub drawings: Vec<Value>,
}

/// Older store files carry explicit `"annotations": null` for records that
/// were never annotated; treat that the same as a missing field.
fn null_to_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

impl PdfRecord {
    /// Case-insensitive substring match against title, abstract and authors.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();

        if let Some(title) = &self.title {
            if title.to_lowercase().contains(&needle) {
                return true;
            }
        }
        if let Some(abstract_text) = &self.abstract_text {
            if abstract_text.to_lowercase().contains(&needle) {
                return true;
            }
        }
        if let Some(authors) = &self.authors {
            if authors.iter().any(|a| a.to_lowercase().contains(&needle)) {
                return true;
            }
        }
        false
    }
}

/// Handle to the JSON store file.
#[derive(Debug, Clone)]
pub struct PdfStore {
    path: PathBuf,
}

impl PdfStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load all records. A missing file is an empty library; a file that
    /// exists but does not parse is an error and propagates.
    pub async fn load(&self) -> Result<Vec<PdfRecord>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let records = serde_json::from_slice(&bytes)?;
        Ok(records)
    }

    /// Serialize the full record list and overwrite the store file.
    pub async fn save(&self, records: &[PdfRecord]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(records)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}
