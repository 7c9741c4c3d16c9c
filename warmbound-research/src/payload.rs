//! Provider payload parsing and sanity rules.
//!
//! The research provider answers in free text that is supposed to be a
//! single JSON object. In practice it often arrives wrapped in markdown
//! code fences, sometimes with a sentence before or after. This module
//! strips that incidental formatting, parses the record, and runs a set of
//! sanity rules on it. A payload that still does not parse is an error with
//! the raw text attached, never a silently defaulted record.

use crate::error::{ResearchError, ResearchResult};
use crate::record::ResearchRecord;

/// Remove markdown code fences and any prose around the JSON object.
///
/// Handles ```` ```json ... ``` ````, bare ```` ``` ```` fences, and text
/// that merely contains an object somewhere in the middle.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix("```") {
        // Drop the info string (`json`, `JSON`, ...) up to the first newline.
        body = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
        if let Some(end) = body.rfind("```") {
            body = &body[..end];
        }
        body = body.trim();
    }

    // Narrow to the outermost braces; prose may sit on either side.
    if let (Some(start), Some(end)) = (body.find('{'), body.rfind('}')) {
        if start < end {
            body = &body[start..=end];
        }
    }
    body
}

/// Parse provider text into a research record, rejecting records that fail
/// validation.
pub fn parse_research_payload(text: &str) -> ResearchResult<ResearchRecord> {
    let body = strip_code_fences(text);
    let record: ResearchRecord =
        serde_json::from_str(body).map_err(|e| ResearchError::Parse {
            reason: e.to_string(),
            raw: text.to_string(),
        })?;

    let validation = validate_record(&record);
    for violation in validation.warnings() {
        log::warn!("research payload {}: {}", violation.rule, violation.detail);
    }
    if !validation.valid {
        let reasons: Vec<String> = validation
            .violations
            .iter()
            .filter(|v| v.severity == Severity::Reject)
            .map(|v| v.detail.clone())
            .collect();
        return Err(ResearchError::Parse {
            reason: reasons.join("; "),
            raw: text.to_string(),
        });
    }

    Ok(record)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.severity == Severity::Warn)
    }
}

#[derive(Debug, Clone)]
pub struct Violation {
    pub rule: &'static str,
    pub detail: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Severity {
    /// The record must not seed any parameters.
    Reject,
    /// The record is usable but the issue is logged.
    Warn,
}

/// Check a parsed record before it reaches the parameter store.
pub fn validate_record(record: &ResearchRecord) -> ValidationResult {
    let mut violations = Vec::new();

    // ================================================================
    // RULE 1: Metrics must be finite and non-negative
    // ================================================================
    let metrics = [
        ("monthlyTraffic", record.monthly_traffic),
        ("acv", record.acv),
        ("tam", record.tam),
        ("linkedinAdSpend", record.linkedin_ad_spend),
        ("googleAdSpend", record.google_ad_spend),
    ];
    for (field, value) in metrics {
        if !value.is_finite() || value < 0.0 {
            violations.push(Violation {
                rule: "METRIC_MUST_BE_NON_NEGATIVE",
                detail: format!("{} must be a non-negative number, got {}", field, value),
                severity: Severity::Reject,
            });
        }
    }

    // ================================================================
    // RULE 2: A record needs a company name to be displayed
    // ================================================================
    if record.company_name.trim().is_empty() {
        violations.push(Violation {
            rule: "COMPANY_NAME_REQUIRED",
            detail: "companyName is empty".into(),
            severity: Severity::Warn,
        });
    }

    // ================================================================
    // RULE 3: Citations should be http(s) URLs
    // ================================================================
    for citation in &record.citations {
        let c = citation.trim();
        if !(c.starts_with("http://") || c.starts_with("https://")) {
            violations.push(Violation {
                rule: "CITATION_NOT_URL",
                detail: format!("citation '{}' is not an http(s) URL", citation),
                severity: Severity::Warn,
            });
        }
    }

    // ================================================================
    // RULE 4: Zero ACV makes every pipeline figure zero
    // ================================================================
    if record.acv == 0.0 {
        violations.push(Violation {
            rule: "ZERO_ACV",
            detail: "acv is 0; every pipeline estimate will be 0".into(),
            severity: Severity::Warn,
        });
    }

    let valid = !violations.iter().any(|v| v.severity == Severity::Reject);
    ValidationResult { valid, violations }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"{"companyName":"Acme","description":"d","monthlyTraffic":50000,"acv":20000,"tam":5000,"linkedinAdSpend":10000,"googleAdSpend":8000,"confidence":"medium","citations":["https://acme.com"]}"#;

    #[test]
    fn bare_json_is_untouched() {
        assert_eq!(strip_code_fences(RECORD), RECORD);
    }

    #[test]
    fn strips_json_fence() {
        let fenced = format!("```json\n{}\n```", RECORD);
        assert_eq!(strip_code_fences(&fenced), RECORD);
    }

    #[test]
    fn strips_bare_fence_and_whitespace() {
        let fenced = format!("  ```\n{}\n```  \n", RECORD);
        assert_eq!(strip_code_fences(&fenced), RECORD);
    }

    #[test]
    fn strips_surrounding_prose() {
        let chatty = format!("Here is the research:\n{}\nLet me know!", RECORD);
        assert_eq!(strip_code_fences(&chatty), RECORD);
    }

    #[test]
    fn strips_trailing_prose() {
        let chatty = format!("{}\nLet me know if you need more detail!", RECORD);
        assert_eq!(strip_code_fences(&chatty), RECORD);
        let record = parse_research_payload(&chatty).unwrap();
        assert_eq!(record.company_name, "Acme");
    }

    #[test]
    fn strips_trailing_prose_after_fence() {
        let chatty = format!("```json\n{}\n```\nSources are estimates.", RECORD);
        assert_eq!(strip_code_fences(&chatty), RECORD);
    }

    #[test]
    fn parses_fenced_payload() {
        let record = parse_research_payload(&format!("```json\n{}\n```", RECORD)).unwrap();
        assert_eq!(record.company_name, "Acme");
        assert_eq!(record.tam, 5000.0);
    }

    #[test]
    fn unparseable_payload_keeps_raw_text() {
        let err = parse_research_payload("Sorry, I couldn't find that company.").unwrap_err();
        assert!(matches!(err, ResearchError::Parse { .. }));
        assert_eq!(err.raw(), Some("Sorry, I couldn't find that company."));
    }

    #[test]
    fn negative_metric_is_rejected() {
        let bad = RECORD.replace("\"tam\":5000", "\"tam\":-5");
        let err = parse_research_payload(&bad).unwrap_err();
        match err {
            ResearchError::Parse { reason, raw } => {
                assert!(reason.contains("tam"));
                assert_eq!(raw, bad);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn warnings_do_not_invalidate() {
        let record: ResearchRecord =
            serde_json::from_str(&RECORD.replace("https://acme.com", "acme.com")).unwrap();
        let result = validate_record(&record);
        assert!(result.valid);
        assert!(result.warnings().any(|v| v.rule == "CITATION_NOT_URL"));
    }

    #[test]
    fn zero_acv_warns() {
        let record: ResearchRecord =
            serde_json::from_str(&RECORD.replace("\"acv\":20000", "\"acv\":0")).unwrap();
        let result = validate_record(&record);
        assert!(result.valid);
        assert!(result.violations.iter().any(|v| v.rule == "ZERO_ACV"));
    }
}
