use anyhow::Context;
use chrono::Utc;
use serde::Serialize;

use warmbound_funnel::{
    format_count, format_currency, format_percent, ChannelResult, CompanyMetrics, ParamKey,
    ParamUnit, Params, RoiResult, SavingsResult,
};
use warmbound_research::{LookupSource, MetricNotes};

use crate::batch::BatchEstimate;
use crate::estimate::Estimate;

// ---------------------------------------------------------------------------
// JSON output contract
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct EstimateJson<'a> {
    generated_at: String,
    key: &'a str,
    source: LookupSource,
    fetched_at: String,
    company: &'a CompanyMetrics,
    notes: &'a MetricNotes,
    params: &'a Params,
    result: RoiResult,
    total_value: f64,
    warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct BatchJson<'a> {
    generated_at: String,
    companies: Vec<BatchRowJson<'a>>,
    summary: BatchSummaryJson,
}

#[derive(Serialize)]
struct BatchRowJson<'a> {
    company: &'a str,
    params: &'a Params,
    result: &'a RoiResult,
    total_value: f64,
}

#[derive(Serialize)]
struct BatchSummaryJson {
    companies: usize,
    total_pipeline: f64,
    total_revenue: f64,
    total_ad_savings: f64,
}

pub fn build_estimate_json(estimate: &Estimate) -> anyhow::Result<EstimateJson<'_>> {
    let snapshot = estimate
        .store
        .snapshot()
        .context("Estimate has no parameter snapshot")?;
    let result = estimate.store.result().context("Estimate has no result")?;

    Ok(EstimateJson {
        generated_at: Utc::now().to_rfc3339(),
        key: &estimate.lookup.key,
        source: estimate.lookup.source,
        fetched_at: estimate.lookup.fetched_at.to_rfc3339(),
        company: &snapshot.metrics,
        notes: &snapshot.notes,
        params: &snapshot.params,
        total_value: result.total_value(),
        result,
        warnings: estimate
            .store
            .range_warnings()
            .iter()
            .map(|w| w.to_string())
            .collect(),
    })
}

pub fn build_batch_json(rows: &[BatchEstimate]) -> BatchJson<'_> {
    BatchJson {
        generated_at: Utc::now().to_rfc3339(),
        companies: rows
            .iter()
            .map(|r| BatchRowJson {
                company: &r.company,
                params: &r.params,
                result: &r.result,
                total_value: r.result.total_value(),
            })
            .collect(),
        summary: BatchSummaryJson {
            companies: rows.len(),
            total_pipeline: rows.iter().map(|r| r.result.total_pipeline).sum(),
            total_revenue: rows.iter().map(|r| r.result.total_revenue).sum(),
            total_ad_savings: rows.iter().map(|r| r.result.total_ad_savings).sum(),
        },
    }
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

/// Format a number with comma thousands separators.
pub fn format_dollars(amount: f64) -> String {
    if !amount.is_finite() {
        return "n/a".into();
    }
    let whole = amount.abs().round() as u64;
    let sign = if amount < 0.0 && whole > 0 { "-" } else { "" };

    let s = whole.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    format!("{}${}", sign, result.chars().rev().collect::<String>())
}

/// A parameter value in its unit's display form.
pub fn format_param(key: ParamKey, value: f64) -> String {
    match key.unit() {
        ParamUnit::Currency => format_currency(value),
        ParamUnit::Count => format_count(value),
        ParamUnit::Percent => format_percent(value),
        ParamUnit::Years => format!("{} yrs", value),
    }
}

fn unit_name(unit: ParamUnit) -> &'static str {
    match unit {
        ParamUnit::Percent => "percent",
        ParamUnit::Currency => "currency",
        ParamUnit::Count => "count",
        ParamUnit::Years => "years",
    }
}

fn banner(lines: &mut Vec<String>, title: &str) {
    let rule = "\u{2550}".repeat(62);
    lines.push(String::new());
    lines.push(format!("  \u{2554}{}\u{2557}", rule));
    lines.push(format!("  \u{2551}{:^62}\u{2551}", title));
    lines.push(format!("  \u{255a}{}\u{255d}", rule));
    lines.push(String::new());
}

fn push_channel(lines: &mut Vec<String>, channel: &ChannelResult) {
    lines.push(format!(
        "  {:32} pipeline {:>8}   revenue {:>8}",
        channel.label,
        format_currency(channel.pipeline),
        format_currency(channel.revenue)
    ));
    for line in &channel.derivation {
        lines.push(format!("       {}", line));
    }
    lines.push(String::new());
}

fn push_savings(lines: &mut Vec<String>, savings: &SavingsResult) {
    lines.push(format!(
        "  {:32} savings  {:>8}",
        savings.label,
        format_currency(savings.savings)
    ));
    for line in &savings.derivation {
        lines.push(format!("       {}", line));
    }
    lines.push(String::new());
}

pub fn render_estimate(estimate: &Estimate) -> anyhow::Result<String> {
    let store = &estimate.store;
    let snapshot = store
        .snapshot()
        .context("Estimate has no parameter snapshot")?;
    let result = store.result().context("Estimate has no result")?;
    let company = &snapshot.metrics;

    let mut lines = Vec::new();
    banner(&mut lines, "WARMBOUND \u{2014} ROI Estimate");

    lines.push(format!("  {}  ({})", company.company_name, estimate.lookup.key));
    if !company.description.is_empty() {
        lines.push(format!("  {}", company.description));
    }
    let source = match estimate.lookup.source {
        LookupSource::Cache => "cached",
        LookupSource::Provider => "fresh",
    };
    lines.push(format!(
        "  confidence {}  \u{00b7}  {} research from {}",
        company.confidence,
        source,
        estimate.lookup.fetched_at.format("%Y-%m-%d %H:%M UTC")
    ));
    lines.push(String::new());

    lines.push(format!("  {:\u{2500}<64}", ""));
    for key in ParamKey::ALL {
        let value = format_param(key, snapshot.params.get(key));
        match snapshot.notes.get(key) {
            Some(note) => lines.push(format!("  {:38} {:>10}  {}", key.label(), value, note)),
            None => lines.push(format!("  {:38} {:>10}", key.label(), value)),
        }
    }
    lines.push(format!("  {:\u{2500}<64}", ""));

    let warnings = store.range_warnings();
    if !warnings.is_empty() {
        lines.push(String::new());
        for w in &warnings {
            lines.push(format!("  ! {}", w));
        }
    }
    lines.push(String::new());

    for channel in result.channels() {
        push_channel(&mut lines, channel);
    }
    for savings in result.savings() {
        push_savings(&mut lines, savings);
    }

    lines.push(format!("  {:\u{2500}<64}", ""));
    lines.push(format!(
        "  Total pipeline {}  \u{00b7}  revenue {}  \u{00b7}  ad savings {}",
        format_dollars(result.total_pipeline),
        format_dollars(result.total_revenue),
        format_dollars(result.total_ad_savings)
    ));
    lines.push(format!(
        "  Total annual value {}",
        format_dollars(result.total_value())
    ));

    if !company.citations.is_empty() {
        lines.push(String::new());
        lines.push("  Sources:".into());
        for (i, url) in company.citations.iter().enumerate() {
            lines.push(format!("    [{}] {}", i + 1, url));
        }
    }
    lines.push(String::new());

    Ok(lines.join("\n"))
}

pub fn render_batch(rows: &[BatchEstimate]) -> String {
    let mut lines = Vec::new();
    banner(&mut lines, "WARMBOUND \u{2014} Batch ROI Estimate");

    if rows.is_empty() {
        lines.push("  No companies in input.".into());
        lines.push(String::new());
        return lines.join("\n");
    }

    lines.push(format!(
        "  {:28} {:>10} {:>10} {:>10} {:>10}",
        "Company", "Pipeline", "Revenue", "Ad savings", "Total"
    ));
    lines.push(format!("  {:\u{2500}<72}", ""));
    for row in rows {
        let r = &row.result;
        lines.push(format!(
            "  {:28} {:>10} {:>10} {:>10} {:>10}",
            row.company,
            format_currency(r.total_pipeline),
            format_currency(r.total_revenue),
            format_currency(r.total_ad_savings),
            format_currency(r.total_value())
        ));
    }
    lines.push(format!("  {:\u{2500}<72}", ""));

    let pipeline: f64 = rows.iter().map(|r| r.result.total_pipeline).sum();
    let value: f64 = rows.iter().map(|r| r.result.total_value()).sum();
    lines.push(format!(
        "  {} companies  \u{00b7}  {} pipeline  \u{00b7}  {} total annual value",
        rows.len(),
        format_dollars(pipeline),
        format_dollars(value)
    ));
    lines.push(String::new());
    lines.join("\n")
}

/// Every parameter with its label, unit and default.
pub fn render_defaults() -> String {
    let defaults = Params::default();
    let mut lines = vec![format!(
        "{:22} {:38} {:9} {}",
        "KEY", "LABEL", "UNIT", "DEFAULT"
    )];
    for key in ParamKey::ALL {
        let default = if key.is_company_metric() {
            "(researched)".to_string()
        } else {
            format_param(key, defaults.get(key))
        };
        lines.push(format!(
            "{:22} {:38} {:9} {}",
            key.as_str(),
            key.label(),
            unit_name(key.unit()),
            default
        ));
    }
    lines.join("\n")
}
