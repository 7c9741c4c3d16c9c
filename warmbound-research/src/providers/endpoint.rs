//! Client for a Warmbound research endpoint (`POST /api/research`).
//!
//! Used when the upstream credentials live on a server rather than on the
//! machine running the estimate.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{ResearchError, ResearchResult};
use crate::payload::parse_research_payload;
use crate::provider::ResearchProvider;
use crate::record::{ResearchRecord, ResearchRequest};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    raw: Option<String>,
}

pub struct ResearchEndpointClient {
    client: Client,
    url: String,
}

impl ResearchEndpointClient {
    /// `url` is the full endpoint URL, e.g. `http://127.0.0.1:8787/api/research`.
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> ResearchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                ResearchError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ResearchProvider for ResearchEndpointClient {
    async fn research(&self, domain: &str) -> ResearchResult<ResearchRecord> {
        let response = self
            .client
            .post(&self.url)
            .json(&ResearchRequest::new(domain))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        decode_response(status, body)
    }
}

/// Success bodies go through the same parse and sanity rules as a direct
/// provider reply; error bodies map back onto `ResearchError`.
fn decode_response(status: StatusCode, body: String) -> ResearchResult<ResearchRecord> {
    if status.is_success() {
        return parse_research_payload(&body);
    }

    let error: Option<ErrorBody> = serde_json::from_str(&body).ok();
    match (status, error) {
        (StatusCode::BAD_REQUEST, Some(e)) => Err(ResearchError::Validation(e.error)),
        (_, Some(ErrorBody { error, raw: Some(raw) })) => {
            Err(ResearchError::Parse { reason: error, raw })
        }
        (_, Some(e)) => Err(ResearchError::Upstream {
            status: status.as_u16(),
            body: e.error,
        }),
        (_, None) => Err(ResearchError::Upstream {
            status: status.as_u16(),
            body,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"{"companyName":"Acme","description":"d","monthlyTraffic":50000,"acv":20000,"tam":5000,"linkedinAdSpend":10000,"googleAdSpend":8000,"confidence":"medium","citations":[]}"#;

    #[test]
    fn success_body_decodes_to_record() {
        let record = decode_response(StatusCode::OK, RECORD.to_string()).unwrap();
        assert_eq!(record.company_name, "Acme");
        assert_eq!(record.acv, 20_000.0);
    }

    #[test]
    fn success_body_with_negative_metric_is_rejected() {
        let body = RECORD.replace(r#""acv":20000"#, r#""acv":-5"#);
        let err = decode_response(StatusCode::OK, body.clone()).unwrap_err();
        assert!(matches!(err, ResearchError::Parse { .. }));
        assert_eq!(err.raw(), Some(body.as_str()));
    }

    #[test]
    fn error_bodies_map_by_status() {
        let err = decode_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Domain is required"}"#.to_string(),
        )
        .unwrap_err();
        assert!(err.is_validation());

        let err = decode_response(StatusCode::BAD_GATEWAY, "gateway down".to_string()).unwrap_err();
        assert!(matches!(err, ResearchError::Upstream { status: 502, .. }));
    }
}
