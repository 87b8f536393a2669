//! HTTP API tests driven through the router without a socket

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use dossier_core::{GenerationClient, ProviderError, TextProvider, NO_CONTENT_FALLBACK};
use dossier_gateway::{Gateway, GatewayConfig};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Replies with a fixed result and counts calls
struct FixedProvider {
    reply: Result<Option<String>, ProviderError>,
    calls: AtomicUsize,
}

impl FixedProvider {
    fn new(reply: Result<Option<String>, ProviderError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn generate(&self, _prompt: &str) -> Result<Option<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

fn router(provider: Arc<FixedProvider>) -> Router {
    router_with(GatewayConfig::default(), provider)
}

fn router_with(config: GatewayConfig, provider: Arc<FixedProvider>) -> Router {
    Gateway::new(config, GenerationClient::new(provider)).build_router()
}

fn ok(text: &str) -> Arc<FixedProvider> {
    FixedProvider::new(Ok(Some(text.to_string())))
}

async fn post(router: Router, uri: &str, body: impl Into<String>) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.into()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let response = router(ok("x"))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], dossier_gateway::VERSION);
}

#[tokio::test]
async fn test_generate_success() {
    let provider = ok("# Acme\n## Description\nAnvils.");
    let (status, body) = post(
        router(provider.clone()),
        "/api/generate-md",
        json!({ "company": "Acme" }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Markdown generated successfully");
    assert_eq!(body["markdown"], "# Acme\n## Description\nAnvils.");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_generate_requires_company() {
    for payload in [json!({}), json!({ "company": "  " }), json!({ "company": 7 })] {
        let provider = ok("x");
        let (status, body) =
            post(router(provider.clone()), "/api/generate-md", payload.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "company field required" }));
        assert_eq!(provider.calls(), 0);
    }
}

#[tokio::test]
async fn test_generate_malformed_body() {
    let provider = ok("x");
    let (status, body) = post(router(provider.clone()), "/api/generate-md", "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Malformed request body"));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_generate_provider_failure_is_generic() {
    let provider = FixedProvider::new(Err(ProviderError::Status {
        status: 403,
        body: "API key leaked".to_string(),
    }));
    let (status, body) = post(
        router(provider),
        "/api/generate-md",
        json!({ "company": "Acme" }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal Server Error" }));
}

#[tokio::test]
async fn test_generate_textless_reply_uses_fallback() {
    let (status, body) = post(
        router(FixedProvider::new(Ok(None))),
        "/api/generate-md",
        json!({ "company": "Acme" }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["markdown"], NO_CONTENT_FALLBACK);
}

#[tokio::test]
async fn test_analyze_and_alias() {
    for uri in ["/api/analyze", "/api/gemini"] {
        let (status, body) = post(
            router(ok("# Analysis\n## Summary\nFine.")),
            uri,
            json!({ "markdown": "# Acme" }).to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "output": "# Analysis\n## Summary\nFine.", "status": "success" })
        );
    }
}

#[tokio::test]
async fn test_analyze_invalid_input() {
    for payload in [
        json!({}).to_string(),
        json!({ "markdown": "" }).to_string(),
        json!({ "markdown": ["a"] }).to_string(),
        "nope".to_string(),
    ] {
        let provider = ok("x");
        let (status, body) = post(router(provider.clone()), "/api/analyze", payload).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "output": "", "status": "error", "message": "Invalid markdown input" })
        );
        assert_eq!(provider.calls(), 0);
    }
}

#[tokio::test]
async fn test_analyze_provider_failure() {
    let (status, body) = post(
        router(FixedProvider::new(Err(ProviderError::Timeout))),
        "/api/analyze",
        json!({ "markdown": "# Acme" }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "output": "", "status": "error", "message": "Failed to analyze markdown" })
    );
}

#[tokio::test]
async fn test_normalize_preview() {
    let (status, body) = post(
        router(ok("x")),
        "/api/normalize",
        json!({ "input": "### Acme\n**Industry:** Tech" }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rule"], "markdown_fields");
    assert_eq!(body["record"], json!({ "industry": "Tech", "name": "Acme" }));

    let (_, body) = post(router(ok("x")), "/api/normalize", json!({ "input": "" }).to_string()).await;
    assert_eq!(body, json!({ "rule": "raw", "record": null }));
}

#[tokio::test]
async fn test_render_blocks() {
    let (status, body) = post(
        router(ok("x")),
        "/api/render",
        json!({ "markdown": "# Acme\n\n* Anvils" }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let blocks = body["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["type"], "heading");
    assert_eq!(blocks[1]["type"], "list");
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let provider = ok("x");
    let router = router_with(GatewayConfig::default().with_max_body_bytes(64), provider.clone());
    let body = json!({ "company": "A".repeat(500) }).to_string();

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generate-md")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(provider.calls(), 0);
}
