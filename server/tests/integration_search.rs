use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use docsearch_core::EngineConfig;
use http_body_util::BodyExt;
use serde_json::Value;
use std::fs;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

fn build_tiny_app(encoding: Option<&str>) -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    let corpus = dir.path().join("docs.jsonl");
    fs::write(
        &corpus,
        "{\"body\": \"the cat sat\"}\n{\"body\": \"the dog ran\"}\n{\"body\": \"cats and dogs\"}\n",
    )
    .unwrap();

    let mut config = EngineConfig::new(&corpus);
    config.methods = vec!["lowercase".into()];
    config.encoding = encoding.map(String::from);
    config.cache_dir = dir.path().join("index");
    let app = server::build_app(&config).unwrap();
    (dir, app)
}

async fn call(app: Router, uri: &str) -> (StatusCode, Bytes) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

#[tokio::test]
async fn documents_returns_matching_texts() {
    let (_dir, app) = build_tiny_app(None);
    let (status, body) = call(app, "/documents?query=the").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!(["the cat sat", "the dog ran"]));
}

#[tokio::test]
async fn indexes_returns_ordinals() {
    let (_dir, app) = build_tiny_app(Some("delta"));
    let (status, body) = call(app, "/indexes?query=the%20cat").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!([0]));
}

#[tokio::test]
async fn unknown_term_is_empty_not_error() {
    let (_dir, app) = build_tiny_app(Some("gamma"));
    let (status, body) = call(app, "/indexes?query=elephant").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"[]");
}

#[tokio::test]
async fn missing_query_is_client_error() {
    let (_dir, app) = build_tiny_app(None);
    let (status, _) = call(app.clone(), "/documents").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(app, "/indexes").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn root_and_health() {
    let (_dir, app) = build_tiny_app(None);
    let (status, body) = call(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"App is working");
    let (_, body) = call(app, "/health").await;
    assert_eq!(&body[..], b"ok");
}

#[test]
fn unknown_encoding_fails_at_startup() {
    let dir = tempdir().unwrap();
    let mut config = EngineConfig::new(dir.path());
    config.encoding = Some("rle".into());
    assert!(server::build_app(&config).is_err());
}

async fn allowed_origin(cors: Option<&str>, origin: &str) -> Option<String> {
    let app = Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .layer(server::cors_layer(cors));
    let req = Request::get("/").header("origin", origin).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    resp.headers()
        .get("access-control-allow-origin")
        .map(|v| v.to_str().unwrap().to_string())
}

#[tokio::test]
async fn cors_allows_any_origin_by_default() {
    assert_eq!(allowed_origin(None, "http://a.example").await.as_deref(), Some("*"));
}

#[tokio::test]
async fn cors_echoes_only_listed_origins() {
    let list = Some("http://a.example, http://b.example");
    assert_eq!(allowed_origin(list, "http://b.example").await.as_deref(), Some("http://b.example"));
    assert_eq!(allowed_origin(list, "http://c.example").await, None);
}
