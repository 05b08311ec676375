//! End-to-end API tests
//!
//! Drives the real router against a temporary library directory, with a
//! throwaway local axum server standing in for the upstream origin that
//! serves PDF bytes.

use std::net::SocketAddr;

use axum::{http::StatusCode, routing::get, Router};
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use estante_server::config::{ArxivConfig, Config, LibraryConfig, ServerConfig};
use estante_server::state::AppState;

/// A minimal one-page PDF; MuPDF repairs the xref if the offsets drift.
const ONE_PAGE_PDF: &[u8] = b"%PDF-1.4\n\
1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n\
3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 300] >>\nendobj\n\
xref\n0 4\n\
0000000000 65535 f \n\
0000000009 00000 n \n\
0000000058 00000 n \n\
0000000115 00000 n \n\
trailer\n<< /Size 4 /Root 1 0 R >>\nstartxref\n186\n%%EOF\n";

fn test_server_with_arxiv(dir: &TempDir, arxiv_base_url: &str) -> TestServer {
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        library: LibraryConfig {
            storage_dir: dir.path().join("storage"),
            thumbnails_dir: dir.path().join("thumbnails"),
            database_file: dir.path().join("database.json"),
        },
        arxiv: ArxivConfig {
            base_url: arxiv_base_url.to_string(),
        },
    };
    config.ensure_directories().unwrap();

    let state = AppState::new(config);
    TestServer::new(estante_server::app(state)).unwrap()
}

fn test_server(dir: &TempDir) -> TestServer {
    test_server_with_arxiv(dir, "https://arxiv.org")
}

/// Spawn a local upstream serving a valid PDF and a permanent 404.
async fn spawn_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/files/paper.pdf", get(|| async { ONE_PAGE_PDF }))
        .route(
            "/files/gone.pdf",
            get(|| async { (StatusCode::NOT_FOUND, "no such file") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

const ABSTRACT_PAGE: &str = r#"
    <html><body>
      <h1 class="title mathjax"><span class="descriptor">Title:</span>Attention Is All You Need</h1>
      <div class="authors">
        <a href="/a/vaswani_a_1">Ashish Vaswani</a>,
        <a href="/a/shazeer_n_1">Noam Shazeer</a>
      </div>
      <blockquote class="abstract mathjax">
        <span class="descriptor">Abstract:</span>
        The dominant sequence transduction models are based on recurrent networks.
      </blockquote>
      <div class="submission-history">
        [v1] Mon, 12 Jun 2017 17:57:34 UTC (1,102 KB)
      </div>
    </body></html>
"#;

const ABSTRACT_PAGE_NO_AUTHORS: &str = r#"
    <html><body>
      <h1 class="title mathjax">Title:Sparse Networks</h1>
      <blockquote class="abstract mathjax">Abstract: Short.</blockquote>
    </body></html>
"#;

/// Spawn a local stand-in for the arXiv origin: abstract pages under `/abs/`
/// and the derived PDFs under `/pdf/`.
async fn spawn_arxiv_upstream() -> SocketAddr {
    use axum::response::Html;

    let app = Router::new()
        .route("/abs/2401.00001", get(|| async { Html(ABSTRACT_PAGE) }))
        .route("/pdf/2401.00001.pdf", get(|| async { ONE_PAGE_PDF }))
        .route(
            "/abs/2401.00002",
            get(|| async { Html(ABSTRACT_PAGE_NO_AUTHORS) }),
        )
        .route("/pdf/2401.00002.pdf", get(|| async { ONE_PAGE_PDF }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn download_persists_file_and_record() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir);
    let upstream = spawn_upstream().await;

    let res = server
        .post("/download-pdf")
        .json(&json!({ "url": format!("http://{upstream}/files/paper.pdf") }))
        .await;
    res.assert_status_ok();

    let body: Value = res.json();
    let id = body["id"].as_str().unwrap().to_string();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("downloaded successfully"));

    // Stored bytes are identical to what the upstream served.
    let stored = std::fs::read(dir.path().join("storage").join(format!("{id}.pdf"))).unwrap();
    assert_eq!(stored, ONE_PAGE_PDF);

    // The record is retrievable and carries only the mandatory fields.
    let res = server.get(&format!("/pdfs/{id}")).await;
    res.assert_status_ok();
    let record: Value = res.json();
    assert_eq!(record["filename"], "paper.pdf");
    assert_eq!(
        record["url"],
        format!("http://{upstream}/files/paper.pdf")
    );
    assert_eq!(record["title"], Value::Null);
    assert_eq!(record["authors"], Value::Null);
    assert_eq!(
        record["thumbnail_url"],
        format!("/thumbnails/{id}.png")
    );

    // Raw bytes round-trip through the serve endpoint.
    let res = server.get(&format!("/pdfs/serve/{id}")).await;
    res.assert_status_ok();
    assert_eq!(res.as_bytes().as_ref(), ONE_PAGE_PDF);

    // And the thumbnail is fetchable as a PNG.
    let res = server.get(&format!("/thumbnails/{id}.png")).await;
    res.assert_status_ok();
    assert_eq!(&res.as_bytes()[1..4], b"PNG");
}

#[tokio::test]
async fn upstream_404_leaves_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir);
    let upstream = spawn_upstream().await;

    let res = server
        .post("/download-pdf")
        .json(&json!({ "url": format!("http://{upstream}/files/gone.pdf") }))
        .await;
    res.assert_status(StatusCode::NOT_FOUND);

    // No orphan record, no orphan file.
    let res = server.get("/pdfs").await;
    res.assert_status_ok();
    let records: Vec<Value> = res.json();
    assert!(records.is_empty());
    assert!(!dir.path().join("database.json").exists());
    assert_eq!(
        std::fs::read_dir(dir.path().join("storage")).unwrap().count(),
        0
    );
}

#[tokio::test]
async fn arxiv_rejects_non_abstract_urls() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir);

    // Structural check only: no network call happens, so an unroutable
    // host would not matter.
    let res = server
        .post("/download-arxiv-pdf")
        .json(&json!({ "arxiv_url": "https://example.com/abs/1706.03762" }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);

    let res = server
        .post("/download-arxiv-pdf")
        .json(&json!({ "arxiv_url": "https://arxiv.org/pdf/1706.03762.pdf" }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn arxiv_ingestion_populates_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let arxiv = spawn_arxiv_upstream().await;
    let base = format!("http://{arxiv}");
    let server = test_server_with_arxiv(&dir, &base);

    let res = server
        .post("/download-arxiv-pdf")
        .json(&json!({ "arxiv_url": format!("{base}/abs/2401.00001") }))
        .await;
    res.assert_status_ok();

    let body: Value = res.json();
    assert_eq!(
        body["message"],
        "ArXiv PDF 'Attention Is All You Need' downloaded successfully!"
    );
    let id = body["id"].as_str().unwrap().to_string();

    let res = server.get(&format!("/pdfs/{id}")).await;
    res.assert_status_ok();
    let record: Value = res.json();
    assert_eq!(record["title"], "Attention Is All You Need");
    assert_eq!(
        record["authors"],
        json!(["Ashish Vaswani", "Noam Shazeer"])
    );
    assert_eq!(record["publication_date"], "Mon, 12 Jun 2017");
    assert!(record["abstract_text"]
        .as_str()
        .unwrap()
        .starts_with("The dominant sequence transduction models"));
    assert_eq!(record["filename"], "Attention_Is_All_You_Need.pdf");
    // The record stores the derived PDF URL, never the abstract page.
    assert_eq!(record["url"], format!("{base}/pdf/2401.00001.pdf"));

    let stored = std::fs::read(dir.path().join("storage").join(format!("{id}.pdf"))).unwrap();
    assert_eq!(stored, ONE_PAGE_PDF);

    let res = server.get(&format!("/pdfs/serve/{id}")).await;
    res.assert_status_ok();
    assert_eq!(res.as_bytes().as_ref(), ONE_PAGE_PDF);
}

#[tokio::test]
async fn arxiv_ingestion_without_authors_still_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let arxiv = spawn_arxiv_upstream().await;
    let base = format!("http://{arxiv}");
    let server = test_server_with_arxiv(&dir, &base);

    let res = server
        .post("/download-arxiv-pdf")
        .json(&json!({ "arxiv_url": format!("{base}/abs/2401.00002") }))
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    let id = body["id"].as_str().unwrap().to_string();

    let res = server.get(&format!("/pdfs/{id}")).await;
    let record: Value = res.json();
    assert_eq!(record["title"], "Sparse Networks");
    assert_eq!(record["authors"], json!(["No Authors Found"]));
    assert_eq!(record["publication_date"], "No Date Found");
    assert_eq!(record["abstract_text"], "Short.");
}

#[tokio::test]
async fn delete_removes_record_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir);
    let upstream = spawn_upstream().await;

    let res = server
        .post("/download-pdf")
        .json(&json!({ "url": format!("http://{upstream}/files/paper.pdf") }))
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    let id = body["id"].as_str().unwrap().to_string();

    let pdf_file = dir.path().join("storage").join(format!("{id}.pdf"));
    assert!(pdf_file.exists());

    let res = server.delete(&format!("/pdfs/{id}")).await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["message"], "PDF deleted successfully");
    assert!(!pdf_file.exists());

    let res = server.get(&format!("/pdfs/{id}")).await;
    res.assert_status(StatusCode::NOT_FOUND);

    // Deleting the same id again is a 404, not a no-op success.
    let res = server.delete(&format!("/pdfs/{id}")).await;
    res.assert_status(StatusCode::NOT_FOUND);
}

fn seeded_records() -> Value {
    json!([
        {
            "id": "rec-1",
            "filename": "quantum.pdf",
            "url": "https://arxiv.org/pdf/1111.0001.pdf",
            "download_date": "2024-01-01T00:00:00Z",
            "title": "Quantum Error Correction",
            "authors": ["Alice Smith"],
            "abstract_text": "Stabilizer codes.",
            "publication_date": "Mon, 1 Jan 2024",
            "annotations": [],
            "drawings": []
        },
        {
            "id": "rec-2",
            "filename": "fluids.pdf",
            "url": "https://example.com/fluids.pdf",
            "download_date": "2024-02-01T00:00:00Z",
            "title": "Turbulent Flows",
            "authors": ["Carol Quantumson"],
            "abstract_text": "Navier-Stokes.",
            "publication_date": "Thu, 1 Feb 2024",
            "annotations": [],
            "drawings": []
        },
        {
            "id": "rec-3",
            "filename": "plain.pdf",
            "url": "https://example.com/plain.pdf",
            "download_date": "2024-03-01T00:00:00Z",
            "annotations": [],
            "drawings": []
        }
    ])
}

#[tokio::test]
async fn list_filters_by_query_case_insensitively() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir);
    std::fs::write(
        dir.path().join("database.json"),
        serde_json::to_vec_pretty(&seeded_records()).unwrap(),
    )
    .unwrap();

    // No query: everything, in insertion order.
    let res = server.get("/pdfs").await;
    res.assert_status_ok();
    let all: Vec<Value> = res.json();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0]["id"], "rec-1");
    assert_eq!(all[2]["id"], "rec-3");

    // Matches title of rec-1 and author of rec-2, never the bare rec-3.
    let res = server.get("/pdfs").add_query_param("query", "QUANTUM").await;
    res.assert_status_ok();
    let hits: Vec<Value> = res.json();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["id"], "rec-1");
    assert_eq!(hits[1]["id"], "rec-2");

    // Abstract matching.
    let res = server.get("/pdfs").add_query_param("query", "stabilizer").await;
    let hits: Vec<Value> = res.json();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["id"], "rec-1");

    let res = server.get("/pdfs").add_query_param("query", "neutrino").await;
    let hits: Vec<Value> = res.json();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn annotations_replace_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir);
    std::fs::write(
        dir.path().join("database.json"),
        serde_json::to_vec_pretty(&seeded_records()).unwrap(),
    )
    .unwrap();

    let res = server
        .post("/pdfs/rec-1/annotations")
        .json(&json!({
            "annotations": [{"page": 2, "text": "check the proof"}],
            "drawings": [{"page": 1, "stroke": [[0, 0], [10, 10]]}]
        }))
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["message"], "Annotations saved successfully");

    let res = server.get("/pdfs/rec-1").await;
    let record: Value = res.json();
    assert_eq!(record["annotations"][0]["text"], "check the proof");
    assert_eq!(record["drawings"].as_array().unwrap().len(), 1);

    // A second save replaces rather than merges.
    let res = server
        .post("/pdfs/rec-1/annotations")
        .json(&json!({ "annotations": [], "drawings": [] }))
        .await;
    res.assert_status_ok();
    let res = server.get("/pdfs/rec-1").await;
    let record: Value = res.json();
    assert!(record["annotations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn annotations_reject_non_object_elements() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir);
    let db_path = dir.path().join("database.json");
    std::fs::write(
        &db_path,
        serde_json::to_vec_pretty(&seeded_records()).unwrap(),
    )
    .unwrap();
    let before = std::fs::read(&db_path).unwrap();

    let res = server
        .post("/pdfs/rec-1/annotations")
        .json(&json!({ "annotations": [1, "x"], "drawings": [] }))
        .await;
    res.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(std::fs::read(&db_path).unwrap(), before);
}

#[tokio::test]
async fn annotations_on_unknown_id_leave_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir);
    let db_path = dir.path().join("database.json");
    std::fs::write(
        &db_path,
        serde_json::to_vec_pretty(&seeded_records()).unwrap(),
    )
    .unwrap();
    let before = std::fs::read(&db_path).unwrap();

    let res = server
        .post("/pdfs/no-such-id/annotations")
        .json(&json!({ "annotations": [{"x": 1}], "drawings": [] }))
        .await;
    res.assert_status(StatusCode::NOT_FOUND);

    assert_eq!(std::fs::read(&db_path).unwrap(), before);
}

#[tokio::test]
async fn serve_missing_record_and_missing_file_both_404() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir);
    std::fs::write(
        dir.path().join("database.json"),
        serde_json::to_vec_pretty(&seeded_records()).unwrap(),
    )
    .unwrap();

    // Unknown record.
    let res = server.get("/pdfs/serve/no-such-id").await;
    res.assert_status(StatusCode::NOT_FOUND);

    // Known record, but no file on disk behind it.
    let res = server.get("/pdfs/serve/rec-1").await;
    res.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_thumbnail_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir);

    let res = server.get("/thumbnails/nope.png").await;
    res.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_version() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir);

    let res = server.get("/health").await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
