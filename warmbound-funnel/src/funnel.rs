//! Declarative multiplicative funnels.
//!
//! A channel is a seed quantity pushed through an ordered list of stages.
//! Each stage multiplies the running quantity either by a raw factor
//! (months per year, years of backlog) or by a percentage. Evaluation keeps
//! every intermediate value and writes one derivation line per stage.

use crate::format::{format_count, format_percent};

/// How a stage transforms the running quantity.
#[derive(Clone, Debug, PartialEq)]
pub enum Factor {
    /// Multiply by `value`, shown as `× {value} {unit}`.
    Scale { value: f64, unit: &'static str },
    /// Multiply by `pct / 100`, shown as `× {pct}% {label}`.
    Rate { pct: f64, label: &'static str },
}

impl Factor {
    fn apply(&self, input: f64) -> f64 {
        match *self {
            Factor::Scale { value, .. } => input * value,
            Factor::Rate { pct, .. } => input * pct / 100.0,
        }
    }

    fn describe(&self) -> String {
        match self {
            Factor::Scale { value, unit } => format!("{} {}", value, unit),
            Factor::Rate { pct, label } => format!("{} {}", format_percent(*pct), label),
        }
    }
}

/// One named step of a funnel. `name` describes the quantity the stage
/// produces.
#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub name: &'static str,
    pub factor: Factor,
}

impl Stage {
    pub fn scale(name: &'static str, value: f64, unit: &'static str) -> Self {
        Self {
            name,
            factor: Factor::Scale { value, unit },
        }
    }

    pub fn rate(name: &'static str, pct: f64, label: &'static str) -> Self {
        Self {
            name,
            factor: Factor::Rate { pct, label },
        }
    }
}

/// A seed quantity and the stages it flows through.
#[derive(Clone, Debug, PartialEq)]
pub struct Funnel {
    pub seed_name: &'static str,
    pub seed: f64,
    pub stages: Vec<Stage>,
}

impl Funnel {
    pub fn new(seed_name: &'static str, seed: f64) -> Self {
        Self {
            seed_name,
            seed,
            stages: Vec::new(),
        }
    }

    /// Builder-style append.
    pub fn then(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Fold the seed through every stage, left to right.
    pub fn evaluate(&self) -> FunnelTrace {
        let mut values = Vec::with_capacity(self.stages.len() + 1);
        let mut lines = Vec::with_capacity(self.stages.len() + 1);

        values.push((self.seed_name, self.seed));
        lines.push(format!("{}: {}", self.seed_name, format_count(self.seed)));

        let mut current = self.seed;
        for stage in &self.stages {
            let next = stage.factor.apply(current);
            lines.push(format!(
                "{}: {} × {} = {}",
                stage.name,
                format_count(current),
                stage.factor.describe(),
                format_count(next)
            ));
            values.push((stage.name, next));
            current = next;
        }

        FunnelTrace { values, lines }
    }
}

/// Every quantity a funnel produced, in stage order, plus its derivation
/// lines.
#[derive(Clone, Debug, PartialEq)]
pub struct FunnelTrace {
    pub values: Vec<(&'static str, f64)>,
    pub lines: Vec<String>,
}

impl FunnelTrace {
    /// The quantity produced by the last stage (the seed if there are none).
    pub fn output(&self) -> f64 {
        self.values.last().map(|&(_, v)| v).unwrap_or(0.0)
    }

    /// Look up an intermediate quantity by stage name.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, v)| v)
    }
}
