//! Runtime configuration from environment variables (and `.env`).

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use warmbound_research::providers::chat::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use warmbound_research::{
    ChatProviderConfig, ChatResearchProvider, JsonFileCache, ResearchEndpointClient,
    ResearchProvider, ResearchResult,
};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8787";
pub const DEFAULT_CACHE_PATH: &str = ".warmbound/research-cache.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address, e.g. "127.0.0.1:8787"
    pub bind_address: String,

    /// JSON file backing the research cache
    pub cache_path: PathBuf,

    /// Research endpoint the CLI calls instead of the upstream provider
    pub research_endpoint: Option<String>,

    /// Upstream provider key. Checked per request, not at startup.
    pub research_api_key: Option<String>,

    pub research_api_url: String,

    pub research_model: String,

    pub research_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.into(),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            research_endpoint: None,
            research_api_key: None,
            research_api_url: DEFAULT_BASE_URL.into(),
            research_model: DEFAULT_MODEL.into(),
            research_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let research_timeout_secs = match var("RESEARCH_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("RESEARCH_TIMEOUT_SECS", raw))?,
            None => defaults.research_timeout_secs,
        };

        Ok(Self {
            bind_address: var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            cache_path: var("WARMBOUND_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_path),
            research_endpoint: var("RESEARCH_ENDPOINT"),
            research_api_key: var("RESEARCH_API_KEY"),
            research_api_url: var("RESEARCH_API_URL").unwrap_or(defaults.research_api_url),
            research_model: var("RESEARCH_MODEL").unwrap_or(defaults.research_model),
            research_timeout_secs,
        })
    }

    pub fn chat_provider_config(&self) -> ChatProviderConfig {
        ChatProviderConfig {
            api_key: self.research_api_key.clone(),
            base_url: self.research_api_url.clone(),
            model: self.research_model.clone(),
            timeout_secs: self.research_timeout_secs,
        }
    }

    /// The provider the server itself uses: always the upstream API.
    pub fn upstream_provider(&self) -> ResearchResult<Arc<dyn ResearchProvider>> {
        Ok(Arc::new(ChatResearchProvider::new(self.chat_provider_config())?))
    }

    /// The provider the CLI uses: a research endpoint when one is
    /// configured, the upstream API otherwise.
    pub fn cli_provider(&self) -> ResearchResult<Arc<dyn ResearchProvider>> {
        match &self.research_endpoint {
            Some(url) => Ok(Arc::new(ResearchEndpointClient::new(
                url.clone(),
                self.research_timeout_secs,
            )?)),
            None => self.upstream_provider(),
        }
    }

    pub fn research_cache(&self) -> JsonFileCache {
        JsonFileCache::new(self.cache_path.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: '{1}'")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:8787");
        assert_eq!(config.cache_path, PathBuf::from(".warmbound/research-cache.json"));
        assert_eq!(config.research_api_url, "https://api.perplexity.ai");
        assert_eq!(config.research_model, "sonar-pro");
        assert_eq!(config.research_timeout_secs, 60);
        assert!(config.research_api_key.is_none());
        assert!(config.research_endpoint.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BIND_ADDRESS", "0.0.0.0:9000"),
            ("RESEARCH_API_KEY", "pplx-123"),
            ("RESEARCH_ENDPOINT", "http://localhost:8787/api/research"),
            ("RESEARCH_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.research_api_key.as_deref(), Some("pplx-123"));
        assert_eq!(config.research_timeout_secs, 15);
        assert_eq!(config.chat_provider_config().api_key.as_deref(), Some("pplx-123"));
    }

    #[test]
    fn blank_key_counts_as_unset() {
        let config = Config::from_lookup(lookup(&[("RESEARCH_API_KEY", "   ")])).unwrap();
        assert!(config.research_api_key.is_none());
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = Config::from_lookup(lookup(&[("RESEARCH_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for RESEARCH_TIMEOUT_SECS: 'soon'");
    }

    #[test]
    fn cli_prefers_endpoint_when_configured() {
        let config = Config::from_lookup(lookup(&[(
            "RESEARCH_ENDPOINT",
            "http://localhost:8787/api/research",
        )]))
        .unwrap();
        assert_eq!(config.cli_provider().unwrap().name(), "ResearchEndpointClient");
        assert_eq!(config.upstream_provider().unwrap().name(), "ChatResearchProvider");
    }
}
