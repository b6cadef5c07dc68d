//! Integration tests for the API module.

#![cfg(feature = "api")]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

use ai2svg::{
    Converter, ConverterStatus, ExportOutcome, ExportTarget, SafePath, ServiceConfig,
    api::{ConvertResponse, HealthResponse, create_router, create_router_with_converter},
    converter::{InstallGuidance, ProbeReport},
};

/// Converter double that "renders" a fixed number of pages.
struct FakeConverter {
    available: bool,
    pages: usize,
    first_page_error: Option<&'static str>,
}

impl FakeConverter {
    fn with_pages(pages: usize) -> Self {
        Self {
            available: true,
            pages,
            first_page_error: None,
        }
    }
}

#[async_trait]
impl Converter for FakeConverter {
    fn name(&self) -> &str {
        "fake"
    }

    fn install_guidance(&self) -> InstallGuidance {
        InstallGuidance {
            macos: "brew install fake".to_string(),
            linux: "apt install fake".to_string(),
            windows: "winget install fake".to_string(),
            docker: "RUN apt-get install -y fake".to_string(),
        }
    }

    async fn status(&self) -> ConverterStatus {
        if self.available {
            ConverterStatus::available("fake 1.0 is available", Some("1.0.0".to_string()))
        } else {
            ConverterStatus::unavailable("fake executable not found")
        }
    }

    async fn probe(&self, _input: &SafePath) -> ai2svg::Result<ProbeReport> {
        Ok(ProbeReport {
            succeeded: true,
            object_count: Some(self.pages),
            detail: format!("{} objects", self.pages),
        })
    }

    async fn export(&self, _input: &SafePath, output: &Path, target: ExportTarget) -> ai2svg::Result<ExportOutcome> {
        let page = match target {
            ExportTarget::FirstPage => 1,
            ExportTarget::Page(n) => n,
            ExportTarget::WholeDocument => {
                return Ok(ExportOutcome::Failed {
                    diagnostic: "unsupported document".to_string(),
                });
            }
        };

        if page == 1
            && let Some(error) = self.first_page_error
        {
            return Ok(ExportOutcome::Failed {
                diagnostic: error.to_string(),
            });
        }

        // An unpaginated document exports "successfully" without writing anything.
        if self.pages == 0 {
            return Ok(ExportOutcome::Completed);
        }

        if page > self.pages {
            return Ok(ExportOutcome::Failed {
                diagnostic: format!("page {} does not exist", page),
            });
        }

        tokio::fs::write(output, svg_for_page(page)).await?;
        Ok(ExportOutcome::Completed)
    }
}

fn svg_for_page(page: usize) -> String {
    format!(r#"<svg xmlns="http://www.w3.org/2000/svg"><text>page {}</text></svg>"#, page)
}

fn test_config(temp: &TempDir) -> ServiceConfig {
    ServiceConfig {
        temp_dir: temp.path().to_path_buf(),
        ..ServiceConfig::default()
    }
}

fn router(temp: &TempDir, converter: FakeConverter) -> Router {
    create_router_with_converter(test_config(temp), Arc::new(converter))
}

fn multipart_request(field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    let boundary = "X-AI2SVG-BOUNDARY";
    let mut body = format!(
        "--{boundary}\r\n\
Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
Content-Type: application/postscript\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/convert")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

fn upload_request() -> Request<Body> {
    multipart_request("file", "artwork.ai", b"%PDF-1.5 %AI fake illustrator document")
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn remaining_uploads(temp: &TempDir) -> Vec<PathBuf> {
    match std::fs::read_dir(temp.path().join("uploads")) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

fn remaining_workspaces(temp: &TempDir) -> usize {
    std::fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("svg-output-"))
        .count()
}

#[tokio::test]
async fn test_health_reports_available_converter() {
    let temp = tempdir().unwrap();
    let app = router(&temp, FakeConverter::with_pages(1));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, "ok");
    assert!(health.converter.available);
    assert_eq!(health.converter.version.as_deref(), Some("1.0.0"));
}

#[tokio::test]
async fn test_health_with_missing_inkscape() {
    let temp = tempdir().unwrap();
    let mut config = test_config(&temp);
    config.converter.binary = PathBuf::from("/nonexistent/bin/inkscape-missing");
    let app = create_router(config);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["converter"]["available"], false);
    assert!(body["converter"]["message"].as_str().unwrap().contains("could not be executed"));
}

#[tokio::test]
async fn test_convert_without_file() {
    let temp = tempdir().unwrap();
    let app = router(&temp, FakeConverter::with_pages(1));

    let boundary = "----boundary";
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/convert")
                .header("content-type", format!("multipart/form-data; boundary={}", boundary))
                .body(Body::from(format!("--{}--\r\n", boundary)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_convert_non_multipart_request() {
    let temp = tempdir().unwrap();
    let app = router(&temp, FakeConverter::with_pages(1));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/convert")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No file uploaded");
}

#[tokio::test]
async fn test_convert_file_in_unexpected_field() {
    let temp = tempdir().unwrap();
    let app = router(&temp, FakeConverter::with_pages(1));

    let response = app
        .oneshot(multipart_request("document", "artwork.ai", b"data"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No file uploaded");
}

#[tokio::test]
async fn test_convert_rejects_wrong_extension() {
    let temp = tempdir().unwrap();
    let app = router(&temp, FakeConverter::with_pages(1));

    let response = app
        .oneshot(multipart_request("file", "drawing.pdf", b"%PDF-1.5"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains(".ai"));
    assert!(remaining_uploads(&temp).is_empty());
}

#[tokio::test]
async fn test_convert_accepts_uppercase_extension() {
    let temp = tempdir().unwrap();
    let app = router(&temp, FakeConverter::with_pages(1));

    let response = app
        .oneshot(multipart_request("file", "ARTWORK.AI", b"data"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_convert_two_page_document() {
    let temp = tempdir().unwrap();
    let app = router(&temp, FakeConverter::with_pages(2));

    let response = app.oneshot(upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let result: ConvertResponse = serde_json::from_slice(&body).unwrap();

    assert!(result.success);
    assert_eq!(result.count, 2);
    assert_eq!(result.svgs, vec![svg_for_page(1), svg_for_page(2)]);

    assert!(remaining_uploads(&temp).is_empty(), "upload must be deleted after success");
    assert_eq!(remaining_workspaces(&temp), 0);
}

#[tokio::test]
async fn test_convert_with_unavailable_converter() {
    let temp = tempdir().unwrap();
    let converter = FakeConverter {
        available: false,
        ..FakeConverter::with_pages(1)
    };
    let app = router(&temp, converter);

    let response = app.oneshot(upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("not installed"));
    assert_eq!(body["message"], "fake executable not found");
    assert_eq!(body["installation"]["macos"], "brew install fake");

    assert!(remaining_uploads(&temp).is_empty(), "upload must be deleted after failure");
    assert_eq!(remaining_workspaces(&temp), 0);
}

#[tokio::test]
async fn test_convert_first_page_failure() {
    let temp = tempdir().unwrap();
    let converter = FakeConverter {
        first_page_error: Some("Failed to load the requested file"),
        ..FakeConverter::with_pages(3)
    };
    let app = router(&temp, converter);

    let response = app.oneshot(upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Conversion failed");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("Failed to load the requested file")
    );
    assert!(remaining_uploads(&temp).is_empty());
    assert_eq!(remaining_workspaces(&temp), 0);
}

#[tokio::test]
async fn test_convert_unsupported_document_after_fallback() {
    let temp = tempdir().unwrap();
    let app = router(&temp, FakeConverter::with_pages(0));

    let response = app.oneshot(upload_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let message = json_body(response).await["message"].as_str().unwrap().to_string();
    assert!(message.ends_with("corrupted or in an unsupported format: unsupported document"));
    assert!(!message.contains(".:"));
}

#[tokio::test]
async fn test_convert_rejects_oversized_upload() {
    let temp = tempdir().unwrap();
    let mut config = test_config(&temp);
    config.max_upload_mb = 1;
    let app = create_router_with_converter(config, Arc::new(FakeConverter::with_pages(1)));

    let content = vec![b'a'; 1024 * 1024 + 16];
    let response = app
        .oneshot(multipart_request("file", "huge.ai", &content))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "File too large. Maximum size is 1MB");
    assert!(remaining_uploads(&temp).is_empty());
}

#[tokio::test]
async fn test_convert_rate_limited_per_client() {
    let temp = tempdir().unwrap();
    let mut config = test_config(&temp);
    config.rate_limit.max_requests = 1;
    let app = create_router_with_converter(config, Arc::new(FakeConverter::with_pages(1)));

    let client: SocketAddr = "192.0.2.10:50000".parse().unwrap();
    let other: SocketAddr = "192.0.2.11:50000".parse().unwrap();

    let with_peer = |peer: SocketAddr| {
        let mut request = upload_request();
        request.extensions_mut().insert(ConnectInfo(peer));
        request
    };

    let first = app.clone().oneshot(with_peer(client)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.clone().oneshot(with_peer(client)).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key("retry-after"));
    assert!(json_body(second).await["error"].as_str().unwrap().contains("Too many"));

    let third = app.clone().oneshot(with_peer(other)).await.unwrap();
    assert_eq!(third.status(), StatusCode::OK);

    let health = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}
