//! Single-company estimate: lookup, seed, apply edits.

use std::str::FromStr;

use anyhow::{anyhow, Context};
use warmbound_funnel::{EngineConfig, ParamKey};
use warmbound_research::{Lookup, LookupOutcome, ParameterStore, SeedOutcome};

/// One `--set key=value` edit. The value stays text so the store's lenient
/// parsing applies.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldEdit {
    pub key: ParamKey,
    pub value: String,
}

impl FromStr for FieldEdit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
        let key = key.parse::<ParamKey>().map_err(|e| e.to_string())?;
        Ok(Self {
            key,
            value: value.trim().to_string(),
        })
    }
}

pub struct Estimate {
    pub lookup: LookupOutcome,
    pub store: ParameterStore,
}

pub async fn run_estimate(
    lookup: &Lookup,
    domain: &str,
    edits: &[FieldEdit],
    refresh: bool,
    engine: EngineConfig,
) -> anyhow::Result<Estimate> {
    let mut store = ParameterStore::with_config(engine);
    let ticket = store.begin_lookup();

    let outcome = if refresh {
        lookup.refresh(domain).await
    } else {
        lookup.run(domain).await
    }
    .with_context(|| format!("Research lookup failed for '{}'", domain.trim()))?;

    if store.seed_from(ticket, &outcome.record) == SeedOutcome::Stale {
        return Err(anyhow!("Lookup for '{}' was superseded", outcome.key));
    }

    for edit in edits {
        store
            .set_field_text(edit.key, &edit.value)
            .with_context(|| format!("Failed to apply {}", edit.key))?;
        log::debug!("applied {}={}", edit.key, edit.value);
    }

    Ok(Estimate {
        lookup: outcome,
        store,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value() {
        let edit: FieldEdit = "acv=25,000".parse().unwrap();
        assert_eq!(edit.key, ParamKey::Acv);
        assert_eq!(edit.value, "25,000");
    }

    #[test]
    fn key_is_case_insensitive() {
        let edit: FieldEdit = "DEALWINRATE= 25 ".parse().unwrap();
        assert_eq!(edit.key, ParamKey::DealWinRate);
        assert_eq!(edit.value, "25");
    }

    #[test]
    fn rejects_missing_equals_and_unknown_keys() {
        assert!("acv".parse::<FieldEdit>().is_err());
        assert!("budget=10".parse::<FieldEdit>().unwrap_err().contains("budget"));
    }
}
