//! Real-socket round trips: CLI endpoint client -> research server -> mock
//! upstream chat-completions API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use warmbound_research::{
    ChatProviderConfig, ChatResearchProvider, Lookup, LookupSource, MemoryCache, ResearchError,
    ResearchEndpointClient, ResearchProvider,
};
use warmbound_server::{create_router, AppState};

const MODEL_CONTENT: &str = "```json\n{\
\"companyName\": \"Acme\",\
\"description\": \"Anvils\",\
\"monthlyTraffic\": 50000, \"monthlyTrafficNote\": \"Similarweb\",\
\"acv\": 20000, \"acvNote\": \"Pricing page\",\
\"tam\": 5000, \"tamNote\": \"\",\
\"linkedinAdSpend\": 10000, \"linkedinAdSpendNote\": \"\",\
\"googleAdSpend\": 8000, \"googleAdSpendNote\": \"\",\
\"confidence\": \"medium\",\
\"citations\": []\
}\n```";

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Mock chat-completions API that requires `Bearer test-key`.
async fn spawn_upstream(content: &'static str) -> SocketAddr {
    let app = Router::new().route(
        "/chat/completions",
        post(move |headers: HeaderMap, Json(request): Json<Value>| async move {
            let authorized = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                == Some("Bearer test-key");
            if !authorized {
                return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad key" })));
            }
            assert_eq!(request["messages"][0]["role"], "system");
            (
                StatusCode::OK,
                Json(json!({
                    "id": "cmpl-test",
                    "model": request["model"],
                    "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }],
                    "citations": ["https://acme.example/about"]
                })),
            )
        }),
    );
    spawn(app).await
}

fn chat_provider(upstream: SocketAddr, key: &str) -> ChatResearchProvider {
    ChatResearchProvider::new(ChatProviderConfig {
        api_key: Some(key.into()),
        base_url: format!("http://{}", upstream),
        model: "test-model".into(),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn chat_provider_parses_fenced_reply_and_backfills_citations() {
    let upstream = spawn_upstream(MODEL_CONTENT).await;
    let record = chat_provider(upstream, "test-key")
        .research("acme.com")
        .await
        .unwrap();

    assert_eq!(record.company_name, "Acme");
    assert_eq!(record.acv, 20_000.0);
    assert_eq!(record.citations, vec!["https://acme.example/about"]);
}

#[tokio::test]
async fn chat_provider_maps_rejection_to_upstream_error() {
    let upstream = spawn_upstream(MODEL_CONTENT).await;
    let err = chat_provider(upstream, "wrong-key")
        .research("acme.com")
        .await
        .unwrap_err();
    assert!(matches!(err, ResearchError::Upstream { status: 401, .. }));
}

#[tokio::test]
async fn endpoint_client_round_trips_through_server() {
    let upstream = spawn_upstream(MODEL_CONTENT).await;
    let server = spawn(create_router(AppState::new(Arc::new(chat_provider(
        upstream, "test-key",
    )))))
    .await;

    let client =
        ResearchEndpointClient::new(format!("http://{}/api/research", server), 5).unwrap();
    let lookup = Lookup::new(Arc::new(MemoryCache::new()), Arc::new(client));

    let first = lookup.run("Acme.com").await.unwrap();
    assert_eq!(first.source, LookupSource::Provider);
    assert_eq!(first.record.company_name, "Acme");
    assert_eq!(first.record.monthly_traffic_note, "Similarweb");

    let second = lookup.run("acme.com").await.unwrap();
    assert_eq!(second.source, LookupSource::Cache);
    assert_eq!(second.record, first.record);
}

#[tokio::test]
async fn endpoint_client_maps_server_errors() {
    let upstream = spawn_upstream("I am not JSON at all").await;
    let server = spawn(create_router(AppState::new(Arc::new(chat_provider(
        upstream, "test-key",
    )))))
    .await;
    let client =
        ResearchEndpointClient::new(format!("http://{}/api/research", server), 5).unwrap();

    let err = client.research("acme.com").await.unwrap_err();
    assert_eq!(err.raw(), Some("I am not JSON at all"));

    let err = client.research("   ").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Domain is required");
}
