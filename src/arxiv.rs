//! arXiv abstract page extraction
//!
//! Narrow, synchronous interface around the fixed structural selectors the
//! arXiv abstract markup currently uses. The selectors are inherently brittle
//! to upstream markup changes, which is exactly why everything lives behind
//! [`extract_metadata`] and plain string helpers: the ingestion pipeline never
//! touches the HTML itself.
//!
//! Missing targets never fail extraction; each field falls back to a
//! `"No X Found"` sentinel so a partially scraped record is still useful.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

/// Abstract pages live under this path on the arXiv origin.
const ABS_PATH: &str = "/abs/";

/// Submission-history lines look like `[v1] Fri, 23 Jun 2023 18:00:00 GMT`.
/// The first weekday/day/month/year match wins.
static SUBMISSION_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w{3}, \d{1,2} \w{3} \d{4}").unwrap());

/// Metadata scraped from one abstract page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArxivMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub publication_date: String,
    pub abstract_text: String,
}

/// The required prefix of an abstract URL for the configured arXiv origin.
pub fn abstract_url_prefix(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), ABS_PATH)
}

/// Whether `url` is an abstract page on the configured arXiv origin.
/// A structural precondition checked before any network call.
pub fn is_abstract_url(url: &str, base_url: &str) -> bool {
    url.starts_with(&abstract_url_prefix(base_url))
}

/// Derive the concrete PDF URL from an abstract URL.
pub fn pdf_url(abstract_url: &str) -> String {
    format!("{}.pdf", abstract_url.replacen("/abs/", "/pdf/", 1))
}

/// Extract title, authors, submission date and abstract from abstract-page
/// HTML. Never fails; absent fields yield sentinel values.
pub fn extract_metadata(html: &str) -> ArxivMetadata {
    let doc = Html::parse_document(html);

    let title = select_text(&doc, "h1.title.mathjax")
        .map(|t| t.replacen("Title:", "", 1).trim().to_string())
        .unwrap_or_else(|| "No Title Found".to_string());

    let authors = select_all_text(&doc, "div.authors a");
    let authors = if authors.is_empty() {
        vec!["No Authors Found".to_string()]
    } else {
        authors
    };

    let publication_date = select_text(&doc, "div.submission-history")
        .and_then(|history| {
            SUBMISSION_DATE_RE
                .find(&history)
                .map(|m| m.as_str().to_string())
        })
        .unwrap_or_else(|| "No Date Found".to_string());

    let abstract_text = select_text(&doc, "blockquote.abstract.mathjax")
        .map(|t| t.replacen("Abstract:", "", 1).trim().to_string())
        .unwrap_or_else(|| "No Abstract Found".to_string());

    ArxivMetadata {
        title,
        authors,
        publication_date,
        abstract_text,
    }
}

/// Turn an extracted title into a filesystem-safe name (no extension).
///
/// Keeps alphanumerics, spaces, periods and underscores, collapses spaces to
/// underscores and truncates to 100 characters, mirroring what a display
/// filename can safely carry.
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '_'))
        .collect();
    let name: String = kept.trim().replace(' ', "_").chars().take(100).collect();

    if name.is_empty() {
        "downloaded_arxiv_pdf".to_string()
    } else {
        name
    }
}

fn select_text(doc: &Html, css: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    doc.select(&sel)
        .next()
        .map(|el| el.text().collect::<String>())
}

fn select_all_text(doc: &Html, css: &str) -> Vec<String> {
    let Ok(sel) = Selector::parse(css) else {
        return Vec::new();
    };
    doc.select(&sel)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .collect()
}
