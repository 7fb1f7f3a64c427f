//! Integration tests for the HTTP surface.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tower::ServiceExt;

use urlcat::config::Config;
use urlcat::render::ScriptedRenderer;
use urlcat::server::{SUCCESS_MESSAGE, Service, router};
use urlcat::testing::page_markers;

use crate::common::{app_state, files_in, url};

fn encode(value: &str) -> String {
    ::url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::TempDir::new().unwrap();
    let app = router(app_state(dir.path(), ScriptedRenderer::new()));

    let (status, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"message": "OK", "success": true}));
}

#[tokio::test]
async fn test_topdf_merges_in_query_order() {
    let dir = tempfile::TempDir::new().unwrap();
    let renderer = ScriptedRenderer::new()
        .with_pages(&url("a"), "A", 1)
        .with_delay(&url("a"), Duration::from_millis(40))
        .with_pages(&url("b"), "B", 2);
    let app = router(app_state(dir.path(), renderer));

    let uri = format!(
        "/topdf?pdf={}&pdf={}&pdfDir=public%2Fpdf",
        encode(&url("a")),
        encode(&url("b"))
    );
    let (status, body) = get(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], SUCCESS_MESSAGE);

    let path = std::path::PathBuf::from(body["path"].as_str().unwrap());
    assert!(path.starts_with(dir.path().join("public/pdf")));
    assert!(path.to_string_lossy().ends_with("_merged.pdf"));
    assert_eq!(page_markers(&path), vec!["A-1", "B-1", "B-2"]);
}

#[tokio::test]
async fn test_topdf_partial_failure_is_success() {
    let dir = tempfile::TempDir::new().unwrap();
    let renderer = ScriptedRenderer::new()
        .with_pages(&url("a"), "A", 1)
        .with_failure(&url("b"), "Failed loading page")
        .with_pages(&url("c"), "C", 1);
    let app = router(app_state(dir.path(), renderer));

    let uri = format!(
        "/topdf?pdf={}&pdf={}&pdf={}&pdfDir=out",
        encode(&url("a")),
        encode(&url("b")),
        encode(&url("c"))
    );
    let (_, body) = get(app, &uri).await;

    assert_eq!(body["success"], true);
    let path = std::path::PathBuf::from(body["path"].as_str().unwrap());
    assert_eq!(page_markers(&path), vec!["A-1", "C-1"]);
}

#[tokio::test]
async fn test_topdf_all_failed() {
    let dir = tempfile::TempDir::new().unwrap();
    let renderer = ScriptedRenderer::new().with_failure(&url("a"), "boom");
    let app = router(app_state(dir.path(), renderer));

    let (status, body) = get(app, &format!("/topdf?pdf={}&pdfDir=out", encode(&url("a")))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body.get("path").is_none());
    assert!(files_in(&dir.path().join("out")).is_empty());
}

#[tokio::test]
async fn test_topdf_missing_parameters() {
    let cases = [
        "/topdf".to_string(),
        "/topdf?pdfDir=out".to_string(),
        "/topdf?pdf=&pdfDir=out".to_string(),
        format!("/topdf?pdf={}", encode(&url("a"))),
        format!("/topdf?pdf={}&pdfDir=", encode(&url("a"))),
    ];

    for uri in cases {
        let dir = tempfile::TempDir::new().unwrap();
        let renderer = ScriptedRenderer::new().with_pages(&url("a"), "A", 1);
        let app = router(app_state(dir.path(), renderer));

        let (status, body) = get(app, &uri).await;

        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
        assert!(body["message"].as_str().unwrap().contains("Invalid request"), "{uri}");
        assert!(files_in(dir.path()).is_empty(), "{uri} touched the filesystem");
    }
}

#[tokio::test]
async fn test_topdf_invalid_options() {
    let dir = tempfile::TempDir::new().unwrap();
    let app = router(app_state(dir.path(), ScriptedRenderer::new()));

    let uri = format!(
        "/topdf?pdf={}&pdfDir=out&options={}",
        encode(&url("a")),
        encode("[1,2]")
    );
    let (_, body) = get(app, &uri).await;

    assert_eq!(body["success"], false);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_topdf_nested_option_arrays_are_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let renderer = ScriptedRenderer::new().with_pages(&url("a"), "A", 1);
    let app = router(app_state(dir.path(), renderer));

    let uri = format!(
        "/topdf?pdf={}&pdfDir=out&options={}",
        encode(&url("a")),
        encode(r#"{"dpi":[[300,"--enable-local-file-access"]]}"#)
    );
    let (status, body) = get(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("Invalid option 'dpi'"));
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_service_lifecycle_over_socket() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        base_dir: dir.path().to_path_buf(),
        ..Config::default()
    };

    let running = Service::start(config, Arc::new(ScriptedRenderer::new()))
        .await
        .unwrap();
    let addr = running.local_addr();
    assert_ne!(addr.port(), 0);

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains(r#""success":true"#));

    running.stop().await.unwrap();
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_topdf_finishes_after_client_disconnects() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        base_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    let renderer = ScriptedRenderer::new()
        .with_pages(&url("a"), "A", 1)
        .with_delay(&url("a"), Duration::from_millis(300))
        .with_pages(&url("b"), "B", 2)
        .with_delay(&url("b"), Duration::from_millis(300));

    let running = Service::start(config, Arc::new(renderer)).await.unwrap();

    let mut stream = TcpStream::connect(running.local_addr()).await.unwrap();
    let request = format!(
        "GET /topdf?pdf={}&pdf={}&pdfDir=out HTTP/1.1\r\nHost: localhost\r\n\r\n",
        encode(&url("a")),
        encode(&url("b"))
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(stream);

    let out = dir.path().join("out");
    let mut merged = Vec::new();
    for _ in 0..40 {
        merged = files_in(&out)
            .into_iter()
            .filter(|name| name.ends_with("_merged.pdf"))
            .collect();
        if !merged.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(merged.len(), 1, "merged document never appeared");
    assert_eq!(page_markers(&out.join(&merged[0])), vec!["A-1", "B-1", "B-2"]);
    running.stop().await.unwrap();
}
