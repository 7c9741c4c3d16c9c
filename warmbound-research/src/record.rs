//! The research record: what the provider says about a company.
//!
//! Wire format is camelCase JSON, shared by the research endpoint, the
//! upstream payload and the local cache.

use serde::{Deserialize, Deserializer, Serialize};
use warmbound_funnel::{CompanyMetrics, Confidence, ParamKey};

use crate::error::{ResearchError, ResearchResult};

/// Body of a research request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResearchRequest {
    #[serde(default)]
    pub domain: Option<String>,
}

impl ResearchRequest {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
        }
    }

    /// The normalized domain, or a validation error when it is missing or
    /// blank.
    pub fn validated_domain(&self) -> ResearchResult<String> {
        let domain = self.domain.as_deref().map(normalize_identifier).unwrap_or_default();
        if domain.is_empty() {
            return Err(ResearchError::Validation("Domain is required".into()));
        }
        Ok(domain)
    }
}

/// Canonical form of a company identifier: trimmed and lowercased.
/// Used as the cache key.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Researched metrics plus a one-line sourcing note per metric.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchRecord {
    pub company_name: String,
    #[serde(default)]
    pub description: String,

    #[serde(deserialize_with = "deserialize_number")]
    pub monthly_traffic: f64,
    #[serde(default)]
    pub monthly_traffic_note: String,

    #[serde(deserialize_with = "deserialize_number")]
    pub acv: f64,
    #[serde(default)]
    pub acv_note: String,

    #[serde(deserialize_with = "deserialize_number")]
    pub tam: f64,
    #[serde(default)]
    pub tam_note: String,

    #[serde(deserialize_with = "deserialize_number")]
    pub linkedin_ad_spend: f64,
    #[serde(default)]
    pub linkedin_ad_spend_note: String,

    #[serde(deserialize_with = "deserialize_number")]
    pub google_ad_spend: f64,
    #[serde(default)]
    pub google_ad_spend_note: String,

    #[serde(default)]
    pub confidence: Confidence,
    /// Source URLs, order preserved.
    #[serde(default)]
    pub citations: Vec<String>,
}

impl ResearchRecord {
    pub fn metrics(&self) -> CompanyMetrics {
        CompanyMetrics {
            company_name: self.company_name.clone(),
            description: self.description.clone(),
            monthly_traffic: self.monthly_traffic,
            acv: self.acv,
            tam: self.tam,
            linkedin_ad_spend: self.linkedin_ad_spend,
            google_ad_spend: self.google_ad_spend,
            confidence: self.confidence,
            citations: self.citations.clone(),
        }
    }

    pub fn notes(&self) -> MetricNotes {
        MetricNotes {
            monthly_traffic: self.monthly_traffic_note.clone(),
            acv: self.acv_note.clone(),
            tam: self.tam_note.clone(),
            linkedin_ad_spend: self.linkedin_ad_spend_note.clone(),
            google_ad_spend: self.google_ad_spend_note.clone(),
        }
    }
}

/// Sourcing notes for the researched metrics, shown next to their fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricNotes {
    pub monthly_traffic: String,
    pub acv: String,
    pub tam: String,
    pub linkedin_ad_spend: String,
    pub google_ad_spend: String,
}

impl MetricNotes {
    /// The note for a researched field. `None` for conversion rates and
    /// for blank notes.
    pub fn get(&self, key: ParamKey) -> Option<&str> {
        let note = match key {
            ParamKey::MonthlyTraffic => &self.monthly_traffic,
            ParamKey::Acv => &self.acv,
            ParamKey::Tam => &self.tam,
            ParamKey::LinkedinAdSpend => &self.linkedin_ad_spend,
            ParamKey::GoogleAdSpend => &self.google_ad_spend,
            _ => return None,
        };
        let note = note.trim();
        (!note.is_empty()).then_some(note)
    }
}

/// Flexible number deserializer: accepts JSON numbers and numeric strings
/// such as `"50000"`, `"$20,000"` or `"1,200"`.
fn deserialize_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | '_' | ' '))
                .collect();
            cleaned.parse::<f64>().map_err(|_| {
                serde::de::Error::custom(format!("expected a number, got '{}'", s))
            })
        }
    }
}
