use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use warmbound_funnel::Confidence;
use warmbound_research::{
    ChatProviderConfig, ChatResearchProvider, ResearchError, ResearchProvider, ResearchRecord,
    ResearchResult,
};
use warmbound_server::{create_router, AppState};

// ---------------------------------------------------------------------------
// Stub providers
// ---------------------------------------------------------------------------

struct FixedProvider;

#[async_trait]
impl ResearchProvider for FixedProvider {
    async fn research(&self, domain: &str) -> ResearchResult<ResearchRecord> {
        Ok(ResearchRecord {
            company_name: format!("Company at {}", domain),
            description: "Widgets".into(),
            monthly_traffic: 50_000.0,
            monthly_traffic_note: "estimate".into(),
            acv: 20_000.0,
            acv_note: String::new(),
            tam: 5_000.0,
            tam_note: String::new(),
            linkedin_ad_spend: 10_000.0,
            linkedin_ad_spend_note: String::new(),
            google_ad_spend: 8_000.0,
            google_ad_spend_note: String::new(),
            confidence: Confidence::High,
            citations: vec!["https://example.com/a".into()],
        })
    }
}

struct GarbledProvider;

#[async_trait]
impl ResearchProvider for GarbledProvider {
    async fn research(&self, _domain: &str) -> ResearchResult<ResearchRecord> {
        Err(ResearchError::Parse {
            reason: "expected value at line 1 column 1".into(),
            raw: "Sorry, I could not find that company.".into(),
        })
    }
}

struct RateLimitedProvider;

#[async_trait]
impl ResearchProvider for RateLimitedProvider {
    async fn research(&self, _domain: &str) -> ResearchResult<ResearchRecord> {
        Err(ResearchError::Upstream {
            status: 429,
            body: "{\"detail\":\"secret account quota details\"}".into(),
        })
    }
}

fn app(provider: Arc<dyn ResearchProvider>) -> Router {
    create_router(AppState::new(provider))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ---------------------------------------------------------------------------
// /api/research
// ---------------------------------------------------------------------------

#[tokio::test]
async fn research_returns_record() {
    let (status, body) = send(
        app(Arc::new(FixedProvider)),
        post_json("/api/research", json!({ "domain": "  Acme.COM " })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["companyName"], "Company at acme.com");
    assert_eq!(body["monthlyTrafficNote"], "estimate");
    assert_eq!(body["confidence"], "high");
    assert_eq!(body["citations"][0], "https://example.com/a");
}

#[tokio::test]
async fn missing_domain_is_bad_request() {
    for payload in [json!({}), json!({ "domain": "" }), json!({ "domain": "   " })] {
        let (status, body) =
            send(app(Arc::new(FixedProvider)), post_json("/api/research", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Domain is required" }));
    }
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/research")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app(Arc::new(FixedProvider)), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn missing_key_surfaces_configuration_message() {
    let provider = ChatResearchProvider::new(ChatProviderConfig::default()).unwrap();
    let (status, body) = send(
        app(Arc::new(provider)),
        post_json("/api/research", json!({ "domain": "acme.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "RESEARCH_API_KEY is not set" }));
}

#[tokio::test]
async fn parse_failure_includes_raw_text() {
    let (status, body) = send(
        app(Arc::new(GarbledProvider)),
        post_json("/api/research", json!({ "domain": "acme.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to parse research response");
    assert_eq!(body["raw"], "Sorry, I could not find that company.");
}

#[tokio::test]
async fn upstream_body_is_not_echoed() {
    let (status, body) = send(
        app(Arc::new(RateLimitedProvider)),
        post_json("/api/research", json!({ "domain": "acme.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Research provider returned 429" }));
}

// ---------------------------------------------------------------------------
// /api/roi, /api/defaults, /health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn roi_computes_reference_scenario() {
    let params = json!({
        "monthlyTraffic": 50000,
        "acv": 20000,
        "tam": 5000,
        "linkedinAdSpend": 10000,
        "googleAdSpend": 8000
    });
    let (status, body) = send(app(Arc::new(FixedProvider)), post_json("/api/roi", params)).await;

    assert_eq!(status, StatusCode::OK);
    let close = |v: &Value, expected: f64| (v.as_f64().unwrap() - expected).abs() < 1e-6;
    assert!(close(&body["warmbound"]["pipeline"], 480_000.0));
    assert!(close(&body["formAbandonment"]["revenue"], 120_600.0));
    assert!(close(&body["crmReactivation"]["pipeline"], 630_000.0));
    assert!(close(&body["totalPipeline"], 1_713_000.0));
    assert!(close(&body["totalRevenue"], 311_100.0));
    assert!(close(&body["totalAdSavings"], 33_600.0));
    assert!(body["warmbound"]["derivation"].as_array().unwrap().len() > 2);
}

#[tokio::test]
async fn roi_rejects_non_numeric_fields() {
    let (status, _) = send(
        app(Arc::new(FixedProvider)),
        post_json("/api/roi", json!({ "acv": "lots" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn defaults_lists_rates() {
    let request = Request::builder()
        .uri("/api/defaults")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(Arc::new(FixedProvider)), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["formFillRate"], 0.5);
    assert_eq!(body["formAbandonRate"], 67.0);
    assert_eq!(body["crmYears"], 5.0);
    assert_eq!(body.as_object().unwrap().len(), 16);
}

#[tokio::test]
async fn health_is_ok() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app(Arc::new(FixedProvider)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}
