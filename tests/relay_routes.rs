//! Integration tests for the relay router.
//!
//! These drive the full axum stack with `oneshot` against a stub completion
//! client and verify:
//!  - every path reaches the dispatcher (the relay has a single endpoint);
//!  - CORS preflight, 405, and the `no-store` header on results;
//!  - rate limiting is keyed by `x-forwarded-for` and answers 429 with
//!    `Retry-After` on the 31st call in a window;
//!  - oversized bodies are answered as a JSON caller-input error with the
//!    relay's CORS and `no-store` headers, without an upstream call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use dentavoice_relay::config::TokenConfig;
use dentavoice_relay::dispatch::Dispatcher;
use dentavoice_relay::limiter::RateLimiter;
use dentavoice_relay::normalize::Usage;
use dentavoice_relay::prompt::{PromptAssembler, PromptPayload};
use dentavoice_relay::server::build_router;
use dentavoice_relay::upstream::{CompletionClient, UpstreamError, UpstreamResult};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Echoes a fixed agent reply and counts calls.
#[derive(Default)]
struct EchoClient {
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionClient for EchoClient {
    fn is_configured(&self) -> bool {
        true
    }

    async fn send(&self, _payload: &PromptPayload) -> Result<UpstreamResult, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(UpstreamResult {
            raw_text: "Lidocaine 2% with 1:100k epinephrine.".into(),
            usage: Usage {
                input_tokens: 40,
                output_tokens: 12,
                cache_read: 0,
                cache_creation: 30,
            },
        })
    }
}

fn app_with(client: Arc<EchoClient>, max_request_bytes: usize) -> Router {
    let dispatcher = Dispatcher::new(
        Arc::new(RateLimiter::new(Duration::from_secs(600), 30)),
        PromptAssembler::new("test-model", TokenConfig::default()),
        client,
    );
    build_router(Arc::new(dispatcher), max_request_bytes)
}

fn agent_post(uri: &str, forwarded_for: &str) -> Request<Body> {
    let body = json!({
        "mode": "agent",
        "messages": [{ "role": "user", "content": "Which anaesthetic for an IANB?" }],
        "needs_patient_data": false
    });
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn parse_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|e| panic!("Expected valid JSON body: {e}"))
}

// ── Success ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn agent_post_returns_reply_and_usage() {
    let client = Arc::new(EchoClient::default());
    let app = app_with(Arc::clone(&client), 1024 * 1024);

    let response = app.oneshot(agent_post("/", "203.0.113.1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
    let json = parse_json(response).await;
    assert_eq!(json["reply"], "Lidocaine 2% with 1:100k epinephrine.");
    assert_eq!(json["usage"]["cache_creation"], 30);
    assert_eq!(json["usage"]["cache_read"], 0);
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn any_path_reaches_the_dispatcher() {
    let app = app_with(Arc::new(EchoClient::default()), 1024 * 1024);
    let response = app
        .oneshot(agent_post("/.netlify/functions/dentavoice", "203.0.113.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ── Method handling ───────────────────────────────────────────────────────────

#[tokio::test]
async fn options_preflight_has_cors_headers() {
    let app = app_with(Arc::new(EchoClient::default()), 1024 * 1024);
    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "Content-Type"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
        "POST, OPTIONS"
    );
}

#[tokio::test]
async fn get_is_method_not_allowed() {
    let client = Arc::new(EchoClient::default());
    let app = app_with(Arc::clone(&client), 1024 * 1024);
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(parse_json(response).await["error"], "Method not allowed");
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

// ── Rate limiting ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn thirty_first_call_from_one_client_is_429() {
    let client = Arc::new(EchoClient::default());
    let app = app_with(Arc::clone(&client), 1024 * 1024);

    for _ in 0..30 {
        let response = app
            .clone()
            .oneshot(agent_post("/", "203.0.113.5, 10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(agent_post("/", "203.0.113.5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response
        .headers()
        .get(header::RETRY_AFTER)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=600).contains(&retry_after));
    assert_eq!(
        parse_json(response).await["error"],
        "Too many requests. Please wait a few minutes."
    );
    assert_eq!(client.calls.load(Ordering::SeqCst), 30);

    // A different forwarded address has its own window.
    let response = app.oneshot(agent_post("/", "203.0.113.6")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ── Body limit ────────────────────────────────────────────────────────────────

fn oversized_ocr_post(declare_length: bool) -> Request<Body> {
    let body = json!({ "mode": "ocr", "image": "A".repeat(1024) }).to_string();
    let mut builder = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.9");
    if declare_length {
        builder = builder.header(header::CONTENT_LENGTH, body.len());
    }
    builder.body(Body::from(body)).unwrap()
}

async fn assert_image_too_large(response: axum::response::Response) {
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let headers = response.headers();
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store");
    assert_eq!(
        parse_json(response).await["error"],
        "Image is too large. Please use a smaller image (under 10MB)."
    );
}

#[tokio::test]
async fn oversized_body_is_json_input_error() {
    let client = Arc::new(EchoClient::default());
    let app = app_with(Arc::clone(&client), 256);

    let response = app.oneshot(oversized_ocr_post(false)).await.unwrap();

    assert_image_too_large(response).await;
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oversized_declared_length_is_json_input_error() {
    let client = Arc::new(EchoClient::default());
    let app = app_with(Arc::clone(&client), 256);

    let response = app.oneshot(oversized_ocr_post(true)).await.unwrap();

    assert_image_too_large(response).await;
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}
