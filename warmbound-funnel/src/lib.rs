//! Warmbound funnel engine.
//!
//! Turns a prospect's company metrics and a set of benchmark conversion
//! rates into per-channel pipeline, revenue and ad-savings estimates.
//! Everything in this crate is pure: no I/O, no logging, no async.

pub mod benchmarks;
pub mod engine;
pub mod format;
pub mod funnel;
pub mod params;

pub use engine::{
    compute_roi, compute_roi_with, ChannelResult, EngineConfig, RoiResult, SavingsResult,
    UpliftBaseline,
};
pub use format::{format_count, format_currency, format_percent};
pub use funnel::{Funnel, FunnelTrace, Stage};
pub use params::{CompanyMetrics, Confidence, ConversionRates, ParamKey, ParamUnit, Params};
