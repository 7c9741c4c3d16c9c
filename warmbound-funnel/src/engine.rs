//! The ROI engine.
//!
//! Three acquisition channels and two ad-savings channels, each an
//! independent funnel over the same `Params` snapshot:
//!
//! 1. Warmbound Uplift: incremental deals from targeting accounts that show
//!    intent instead of the whole market.
//! 2. Form Abandonment Recovery: visitors who started a form but left.
//! 3. CRM Reactivation: a multi-year backlog of dormant leads.
//! 4. LinkedIn / Google ad efficiency: annual spend times an efficiency gain.
//!
//! `compute_roi` is pure and total. It never fails for finite input; zero,
//! negative and out-of-range parameters give degenerate results, not errors.

use serde::Serialize;

use crate::benchmarks::MONTHS_PER_YEAR;
use crate::format::{format_count, format_currency, format_percent};
use crate::funnel::{Funnel, FunnelTrace, Stage};
use crate::params::Params;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which population the cold-outreach baseline is measured against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UpliftBaseline {
    /// Warm and cold meeting rates both apply to the warm-account subset,
    /// so the channel reports only the marginal lift of warm targeting.
    #[default]
    WarmSubset,
    /// Cold meeting rate applies to the whole TAM.
    FullMarket,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub uplift_baseline: UpliftBaseline,
    /// Floor Warmbound deals at zero when the cold rate beats the warm rate.
    pub clamp_negative_uplift: bool,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Output of one acquisition channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResult {
    pub label: &'static str,
    /// Modeled annual deal value before the close/win rate.
    pub pipeline: f64,
    /// Pipeline after the close/win rate.
    pub revenue: f64,
    pub derivation: Vec<String>,
}

impl ChannelResult {
    /// The single-number view of the channel: total deal value with no
    /// win-rate split.
    pub fn deal_value(&self) -> f64 {
        self.pipeline
    }
}

/// Output of one ad-efficiency channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsResult {
    pub label: &'static str,
    pub savings: f64,
    pub derivation: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiResult {
    pub warmbound: ChannelResult,
    pub form_abandonment: ChannelResult,
    pub crm_reactivation: ChannelResult,
    pub linkedin_savings: SavingsResult,
    pub google_savings: SavingsResult,
    pub total_pipeline: f64,
    pub total_revenue: f64,
    pub total_ad_savings: f64,
}

impl RoiResult {
    /// Acquisition channels in display order.
    pub fn channels(&self) -> [&ChannelResult; 3] {
        [&self.warmbound, &self.form_abandonment, &self.crm_reactivation]
    }

    pub fn savings(&self) -> [&SavingsResult; 2] {
        [&self.linkedin_savings, &self.google_savings]
    }

    /// Revenue and ad savings folded into one headline figure.
    pub fn total_value(&self) -> f64 {
        self.total_revenue + self.total_ad_savings
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Compute every channel with the default engine configuration.
pub fn compute_roi(params: &Params) -> RoiResult {
    compute_roi_with(params, &EngineConfig::default())
}

pub fn compute_roi_with(params: &Params, config: &EngineConfig) -> RoiResult {
    let warmbound = warmbound_uplift(params, config);
    let (form_abandonment, form_fills) = form_abandonment(params);
    let crm_reactivation = crm_reactivation(params, form_fills);
    let linkedin_savings = ad_savings(
        "LinkedIn Ad Efficiency",
        "Monthly LinkedIn spend",
        params.linkedin_ad_spend,
        params.rates.linkedin_roi_gain,
    );
    let google_savings = ad_savings(
        "Google Ad Efficiency",
        "Monthly Google spend",
        params.google_ad_spend,
        params.rates.google_roi_gain,
    );

    let total_pipeline =
        warmbound.pipeline + form_abandonment.pipeline + crm_reactivation.pipeline;
    let total_revenue = warmbound.revenue + form_abandonment.revenue + crm_reactivation.revenue;
    let total_ad_savings = linkedin_savings.savings + google_savings.savings;

    RoiResult {
        warmbound,
        form_abandonment,
        crm_reactivation,
        linkedin_savings,
        google_savings,
        total_pipeline,
        total_revenue,
        total_ad_savings,
    }
}

fn warmbound_uplift(p: &Params, config: &EngineConfig) -> ChannelResult {
    let r = &p.rates;
    let warm_accounts = Funnel::new("TAM companies", p.tam)
        .then(Stage::rate("Warm accounts", r.warm_account_pct, "showing intent"))
        .evaluate();
    let mut derivation = warm_accounts.lines.clone();

    let uplift_meetings = match config.uplift_baseline {
        UpliftBaseline::WarmSubset => {
            let reach_delta = r.warm_reach_to_meeting - r.cold_reach_to_meeting;
            derivation.push(format!(
                "Reach lift: {} warm − {} cold = {}",
                format_percent(r.warm_reach_to_meeting),
                format_percent(r.cold_reach_to_meeting),
                format_percent(reach_delta)
            ));
            let meetings = Funnel::new("Warm accounts", warm_accounts.output())
                .then(Stage::rate("Uplift meetings", reach_delta, "reach lift"))
                .evaluate();
            let uplift = meetings.output();
            derivation.extend(meetings.lines.into_iter().skip(1));
            uplift
        }
        UpliftBaseline::FullMarket => {
            let warm = Funnel::new("Warm accounts", warm_accounts.output())
                .then(Stage::rate(
                    "Warm meetings",
                    r.warm_reach_to_meeting,
                    "warm reach to meeting",
                ))
                .evaluate();
            let cold = Funnel::new("TAM companies", p.tam)
                .then(Stage::rate(
                    "Cold meetings",
                    r.cold_reach_to_meeting,
                    "cold reach to meeting",
                ))
                .evaluate();
            let meetings = warm.output() - cold.output();
            derivation.extend(warm.lines.into_iter().skip(1));
            derivation.extend(cold.lines.into_iter().skip(1));
            derivation.push(format!("Uplift meetings: {}", format_count(meetings)));
            meetings
        }
    };

    let deals = Funnel::new("Uplift meetings", uplift_meetings)
        .then(Stage::rate("Uplift deals", r.meeting_to_deal, "meeting to deal"))
        .evaluate();
    let mut uplift_deals = deals.output();
    derivation.extend(deals.lines.into_iter().skip(1));

    if config.clamp_negative_uplift && uplift_deals < 0.0 {
        uplift_deals = 0.0;
        derivation.push("Uplift deals floored at 0".to_string());
    }

    let pipeline = uplift_deals * p.acv;
    let revenue = pipeline * r.deal_to_close / 100.0;
    push_money_lines(
        &mut derivation,
        uplift_deals,
        p.acv,
        pipeline,
        r.deal_to_close,
        revenue,
    );

    ChannelResult {
        label: "Warmbound Uplift",
        pipeline,
        revenue,
        derivation,
    }
}

/// Returns the channel plus the annual form-fill count, which seeds the
/// CRM backlog.
fn form_abandonment(p: &Params) -> (ChannelResult, f64) {
    let r = &p.rates;
    let trace: FunnelTrace = Funnel::new("Monthly visitors", p.monthly_traffic)
        .then(Stage::scale("Annual visitors", MONTHS_PER_YEAR, "months"))
        .then(Stage::rate("Form fills", r.form_fill_rate, "form fill rate"))
        .then(Stage::rate("Abandoned forms", r.form_abandon_rate, "abandon rate"))
        .then(Stage::rate("Recovered demos", r.abandon_to_demo, "abandon to demo"))
        .then(Stage::rate("Deals", r.demo_to_deal, "demo to deal"))
        .evaluate();

    let form_fills = trace.value("Form fills").unwrap_or(0.0);
    let deals = trace.output();
    let pipeline = deals * p.acv;
    let revenue = deals * r.deal_win_rate / 100.0 * p.acv;

    let mut derivation = trace.lines;
    push_money_lines(&mut derivation, deals, p.acv, pipeline, r.deal_win_rate, revenue);

    let channel = ChannelResult {
        label: "Form Abandonment Recovery",
        pipeline,
        revenue,
        derivation,
    };
    (channel, form_fills)
}

fn crm_reactivation(p: &Params, annual_form_fills: f64) -> ChannelResult {
    let r = &p.rates;
    let trace = Funnel::new("Annual form fills", annual_form_fills)
        .then(Stage::scale("CRM leads", r.crm_years, "years"))
        .then(Stage::rate("Reactivated leads", r.reactivation_rate, "reactivation rate"))
        .then(Stage::rate(
            "Reactivation demos",
            r.reactivation_demo_rate,
            "reactivation to demo",
        ))
        .then(Stage::rate("Pipeline deals", r.demo_to_deal, "demo to deal"))
        .evaluate();

    let deals = trace.output();
    let pipeline = deals * p.acv;
    let revenue = deals * r.reactivation_win_rate / 100.0 * p.acv;

    let mut derivation = trace.lines;
    push_money_lines(
        &mut derivation,
        deals,
        p.acv,
        pipeline,
        r.reactivation_win_rate,
        revenue,
    );

    ChannelResult {
        label: "CRM Reactivation",
        pipeline,
        revenue,
        derivation,
    }
}

fn ad_savings(label: &'static str, seed_name: &'static str, monthly: f64, gain: f64) -> SavingsResult {
    let annual_spend = monthly * MONTHS_PER_YEAR;
    let savings = annual_spend * gain / 100.0;

    let derivation = vec![
        format!("{}: {}", seed_name, format_currency(monthly)),
        format!(
            "Annual spend: {} × {} months = {}",
            format_currency(monthly),
            MONTHS_PER_YEAR,
            format_currency(annual_spend)
        ),
        format!(
            "Savings: {} × {} efficiency gain = {}",
            format_currency(annual_spend),
            format_percent(gain),
            format_currency(savings)
        ),
    ];

    SavingsResult {
        label,
        savings,
        derivation,
    }
}

fn push_money_lines(
    lines: &mut Vec<String>,
    deals: f64,
    acv: f64,
    pipeline: f64,
    close_pct: f64,
    revenue: f64,
) {
    lines.push(format!(
        "Pipeline: {} deals × {} ACV = {}",
        format_count(deals),
        format_currency(acv),
        format_currency(pipeline)
    ));
    lines.push(format!(
        "Revenue: {} × {} close rate = {}",
        format_currency(pipeline),
        format_percent(close_pct),
        format_currency(revenue)
    ));
}
