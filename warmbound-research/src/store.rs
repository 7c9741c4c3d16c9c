//! The parameter store: the editable snapshot behind every estimate.
//!
//! State machine:
//!
//! ```text
//! Unseeded ──seed──▶ Seeded ──set_field──▶ Edited
//!                      ▲                     │
//!                      └────────seed─────────┘
//! ```
//!
//! Seeding takes company metrics from a research record and conversion
//! rates from the benchmark defaults, never from the record. Edits replace
//! one field at a time. Results are a pure projection of the current
//! snapshot through the engine.

use thiserror::Error;
use warmbound_funnel::{
    compute_roi_with, CompanyMetrics, ConversionRates, EngineConfig, ParamKey, Params, RoiResult,
};

use crate::record::{MetricNotes, ResearchRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("No company has been looked up yet")]
    NotSeeded,
}

/// Everything the store knows about the current company.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Metrics as researched. User overrides live in `params`.
    pub metrics: CompanyMetrics,
    pub notes: MetricNotes,
    pub params: Params,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StoreState {
    Unseeded,
    Seeded(Snapshot),
    Edited(Snapshot),
}

/// Identifies one lookup so that a slow response cannot overwrite the
/// result of a lookup started after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct LookupTicket(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedOutcome {
    Applied,
    /// A newer lookup was started after this one; the record was dropped.
    Stale,
}

/// A field sitting outside its conventional range.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeWarning {
    pub key: ParamKey,
    pub value: f64,
}

impl std::fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound = match self.key.unit() {
            warmbound_funnel::ParamUnit::Percent => "between 0 and 100",
            warmbound_funnel::ParamUnit::Years => "a whole number of at least 1",
            _ => "non-negative",
        };
        write!(f, "{} is {} (expected {})", self.key.label(), self.value, bound)
    }
}

pub struct ParameterStore {
    state: StoreState,
    config: EngineConfig,
    latest_ticket: u64,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            state: StoreState::Unseeded,
            config,
            latest_ticket: 0,
        }
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match &self.state {
            StoreState::Unseeded => None,
            StoreState::Seeded(s) | StoreState::Edited(s) => Some(s),
        }
    }

    pub fn params(&self) -> Option<&Params> {
        self.snapshot().map(|s| &s.params)
    }

    pub fn metrics(&self) -> Option<&CompanyMetrics> {
        self.snapshot().map(|s| &s.metrics)
    }

    pub fn notes(&self) -> Option<&MetricNotes> {
        self.snapshot().map(|s| &s.notes)
    }

    pub fn is_edited(&self) -> bool {
        matches!(self.state, StoreState::Edited(_))
    }

    /// Start a lookup. Only the most recently issued ticket may seed.
    pub fn begin_lookup(&mut self) -> LookupTicket {
        self.latest_ticket += 1;
        LookupTicket(self.latest_ticket)
    }

    /// Seed from a lookup started with `ticket`, unless a newer lookup has
    /// begun since.
    pub fn seed_from(&mut self, ticket: LookupTicket, record: &ResearchRecord) -> SeedOutcome {
        if ticket.0 != self.latest_ticket {
            log::info!(
                "dropping stale research for {} (ticket {} < {})",
                record.company_name,
                ticket.0,
                self.latest_ticket
            );
            return SeedOutcome::Stale;
        }
        self.apply_seed(record);
        SeedOutcome::Applied
    }

    /// Seed directly, superseding any lookup still in flight.
    pub fn seed(&mut self, record: &ResearchRecord) {
        self.latest_ticket += 1;
        self.apply_seed(record);
    }

    fn apply_seed(&mut self, record: &ResearchRecord) {
        let metrics = record.metrics();
        let params = Params::from_metrics(&metrics, ConversionRates::default());
        self.state = StoreState::Seeded(Snapshot {
            metrics,
            notes: record.notes(),
            params,
        });
    }

    /// Replace one field and return the recomputed result. Non-finite
    /// values are stored as zero.
    pub fn set_field(&mut self, key: ParamKey, value: f64) -> Result<RoiResult, StoreError> {
        let value = if value.is_finite() { value } else { 0.0 };
        let mut snapshot = match std::mem::replace(&mut self.state, StoreState::Unseeded) {
            StoreState::Unseeded => return Err(StoreError::NotSeeded),
            StoreState::Seeded(s) | StoreState::Edited(s) => s,
        };
        snapshot.params.set(key, value);
        self.state = StoreState::Edited(snapshot);
        self.result().ok_or(StoreError::NotSeeded)
    }

    /// Parse user text and set the field. Text that is not a number after
    /// dropping `$`, `%` and thousands separators counts as zero.
    pub fn set_field_text(&mut self, key: ParamKey, text: &str) -> Result<RoiResult, StoreError> {
        self.set_field(key, parse_lenient(text))
    }

    /// Put every conversion rate back to its benchmark default, keeping
    /// company-metric edits.
    pub fn reset_rates(&mut self) -> Result<RoiResult, StoreError> {
        match &mut self.state {
            StoreState::Unseeded => return Err(StoreError::NotSeeded),
            StoreState::Seeded(s) | StoreState::Edited(s) => {
                s.params.rates = ConversionRates::default();
            }
        }
        self.result().ok_or(StoreError::NotSeeded)
    }

    /// Project the current snapshot through the engine.
    pub fn result(&self) -> Option<RoiResult> {
        self.params().map(|p| compute_roi_with(p, &self.config))
    }

    /// Advisory list of out-of-range fields. Never blocks computation.
    pub fn range_warnings(&self) -> Vec<RangeWarning> {
        self.params()
            .map(|p| {
                p.out_of_range()
                    .into_iter()
                    .map(|(key, value)| RangeWarning { key, value })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn parse_lenient(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '%' | ',' | '_' | ' '))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
