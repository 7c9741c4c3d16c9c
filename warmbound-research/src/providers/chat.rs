//! Upstream research through an OpenAI-compatible chat-completions API.
//!
//! The model is asked for a single JSON object matching `ResearchRecord`.
//! Search-grounded providers also return a top-level `citations` array;
//! it backfills the record when the model's own list is empty.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ResearchError, ResearchResult};
use crate::payload::parse_research_payload;
use crate::provider::ResearchProvider;
use crate::record::ResearchRecord;

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_MODEL: &str = "sonar-pro";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const SYSTEM_PROMPT: &str = "You are a B2B market research analyst. \
Given a company domain, research the company and respond with ONLY a JSON object, \
no prose, with exactly these fields: \
companyName (string), description (one sentence), \
monthlyTraffic (number, unique monthly website visitors), monthlyTrafficNote (string, source of the estimate), \
acv (number, annual contract value in USD), acvNote (string), \
tam (number, count of companies in the total addressable market), tamNote (string), \
linkedinAdSpend (number, monthly USD), linkedinAdSpendNote (string), \
googleAdSpend (number, monthly USD), googleAdSpendNote (string), \
confidence (\"low\", \"medium\" or \"high\"), citations (array of source URLs). \
Use your best estimate when exact figures are unavailable and say so in the note.";

/// Settings for the upstream provider. A missing API key is not an error
/// until a lookup is attempted.
#[derive(Clone, Debug)]
pub struct ChatProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ChatProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct ChatResearchProvider {
    client: Client,
    config: ChatProviderConfig,
}

impl ChatResearchProvider {
    pub fn new(config: ChatProviderConfig) -> ResearchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ResearchError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ResearchProvider for ChatResearchProvider {
    async fn research(&self, domain: &str) -> ResearchResult<ResearchRecord> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ResearchError::Configuration("RESEARCH_API_KEY is not set".into()))?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Research the company at {}.", domain),
                },
            ],
            temperature: 0.1,
        };

        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        log::info!(
            "provider={} domain={} status={} elapsed_ms={}",
            self.config.model,
            domain,
            status.as_u16(),
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            log::error!("research provider error {}: {}", status.as_u16(), body);
            return Err(ResearchError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        record_from_chat_body(&body)
    }
}

/// Pull the research record out of a chat-completions response body.
pub fn record_from_chat_body(body: &str) -> ResearchResult<ResearchRecord> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| ResearchError::Parse {
        reason: format!("unexpected provider response: {}", e),
        raw: body.to_string(),
    })?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ResearchError::Parse {
            reason: "provider response has no message content".into(),
            raw: body.to_string(),
        })?;

    let mut record = parse_research_payload(&content)?;
    if record.citations.is_empty() {
        record.citations = parsed.citations;
    }
    Ok(record)
}
