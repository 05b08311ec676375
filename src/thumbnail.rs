//! Best-effort first-page thumbnails
//!
//! Renders page one of a stored PDF to a 150 px wide PNG via MuPDF. A
//! thumbnail is a side artifact: any failure here degrades to
//! [`ThumbnailOutcome::Skipped`] and must never fail the ingestion that
//! requested it.

use std::io::Cursor;
use std::path::Path;

use image::DynamicImage;
use mupdf::{Colorspace, Document, Matrix};
use thiserror::Error;

/// Target output width in pixels. Height follows the page aspect ratio.
pub const THUMBNAIL_WIDTH: f32 = 150.0;

/// Outcome of a thumbnail request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    /// The PNG was written; carries the URL path clients fetch it from.
    Generated(String),
    /// Rendering failed; carries the reason for the log line.
    Skipped(String),
}

#[derive(Debug, Error)]
enum ThumbnailError {
    #[error("PDF error: {0}")]
    Pdf(#[from] mupdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document has no pages")]
    EmptyDocument,

    #[error("first page has a degenerate size")]
    InvalidPageSize,

    #[error("image error: {0}")]
    Image(String),
}

/// Render the first page of `pdf_path` into `<thumbnails_dir>/<id>.png`.
///
/// Rendering is CPU-bound MuPDF work, so it runs on the blocking pool.
pub async fn generate(pdf_path: &Path, id: &str, thumbnails_dir: &Path) -> ThumbnailOutcome {
    let pdf_path = pdf_path.to_path_buf();
    let out_path = thumbnails_dir.join(format!("{id}.png"));
    let id = id.to_string();

    let rendered =
        tokio::task::spawn_blocking(move || render_and_write(&pdf_path, &out_path)).await;

    match rendered {
        Ok(Ok(())) => ThumbnailOutcome::Generated(format!("/thumbnails/{id}.png")),
        Ok(Err(e)) => {
            tracing::warn!(pdf_id = %id, "Thumbnail generation skipped: {}", e);
            ThumbnailOutcome::Skipped(e.to_string())
        }
        Err(e) => {
            tracing::warn!(pdf_id = %id, "Thumbnail task failed: {}", e);
            ThumbnailOutcome::Skipped(e.to_string())
        }
    }
}

fn render_and_write(pdf_path: &Path, out_path: &Path) -> Result<(), ThumbnailError> {
    let data = std::fs::read(pdf_path)?;
    let doc = Document::from_bytes(&data, "application/pdf")?;

    if doc.page_count()? == 0 {
        return Err(ThumbnailError::EmptyDocument);
    }

    let page = doc.load_page(0)?;
    let bounds = page.bounds()?;
    let width = bounds.x1 - bounds.x0;
    if width <= 0.0 {
        return Err(ThumbnailError::InvalidPageSize);
    }

    // Proportional scale so the output is exactly THUMBNAIL_WIDTH wide.
    let scale = THUMBNAIL_WIDTH / width;
    let matrix = Matrix::new_scale(scale, scale);
    let colorspace = Colorspace::device_rgb();
    let pixmap = page.to_pixmap(&matrix, &colorspace, true, false)?;

    let png = encode_png(&pixmap)?;
    std::fs::write(out_path, png)?;
    Ok(())
}

fn encode_png(pixmap: &mupdf::Pixmap) -> Result<Vec<u8>, ThumbnailError> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    // Convert MuPDF samples (n components per pixel) to an RGBA buffer.
    let mut rgba_buffer = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(0);
            let g = samples.get(offset + 1).copied().unwrap_or(0);
            let b = samples.get(offset + 2).copied().unwrap_or(0);
            let a = if n >= 4 {
                samples.get(offset + 3).copied().unwrap_or(255)
            } else {
                255
            };
            rgba_buffer.extend_from_slice(&[r, g, b, a]);
        }
    }

    let img = image::RgbaImage::from_raw(width, height, rgba_buffer)
        .ok_or_else(|| ThumbnailError::Image("Failed to create image buffer".to_string()))?;

    let mut output = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| ThumbnailError::Image(e.to_string()))?;

    Ok(output)
}
