//! Engine inputs: researched company metrics and tunable conversion rates.
//!
//! `Params` is the single struct the engine reads. It is the numeric part of
//! `CompanyMetrics` merged with a `ConversionRates` set, and every field can
//! be addressed individually through `ParamKey`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::benchmarks;

// ---------------------------------------------------------------------------
// Company metrics
// ---------------------------------------------------------------------------

/// How much the research step trusts its own numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Researched facts about a prospect.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMetrics {
    pub company_name: String,
    pub description: String,
    /// Unique site visitors per month.
    pub monthly_traffic: f64,
    /// Annual contract value of a won deal, in dollars.
    pub acv: f64,
    /// Number of companies in the total addressable market.
    pub tam: f64,
    /// Monthly LinkedIn ad spend, in dollars.
    pub linkedin_ad_spend: f64,
    /// Monthly Google ad spend, in dollars.
    pub google_ad_spend: f64,
    pub confidence: Confidence,
    /// Source URLs, in the order the research step returned them.
    pub citations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Conversion rates
// ---------------------------------------------------------------------------

/// Funnel transition parameters. Percentages are on a 0-100 scale;
/// `crm_years` is a count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionRates {
    pub form_fill_rate: f64,
    pub form_abandon_rate: f64,
    pub abandon_to_demo: f64,
    pub demo_to_deal: f64,
    pub deal_win_rate: f64,
    pub cold_reach_to_meeting: f64,
    pub warm_reach_to_meeting: f64,
    pub meeting_to_deal: f64,
    pub deal_to_close: f64,
    pub warm_account_pct: f64,
    pub crm_years: f64,
    pub reactivation_rate: f64,
    pub reactivation_demo_rate: f64,
    pub reactivation_win_rate: f64,
    pub linkedin_roi_gain: f64,
    pub google_roi_gain: f64,
}

impl Default for ConversionRates {
    fn default() -> Self {
        Self {
            form_fill_rate: benchmarks::FORM_FILL_RATE,
            form_abandon_rate: benchmarks::FORM_ABANDON_RATE,
            abandon_to_demo: benchmarks::ABANDON_TO_DEMO,
            demo_to_deal: benchmarks::DEMO_TO_DEAL,
            deal_win_rate: benchmarks::DEAL_WIN_RATE,
            cold_reach_to_meeting: benchmarks::COLD_REACH_TO_MEETING,
            warm_reach_to_meeting: benchmarks::WARM_REACH_TO_MEETING,
            meeting_to_deal: benchmarks::MEETING_TO_DEAL,
            deal_to_close: benchmarks::DEAL_TO_CLOSE,
            warm_account_pct: benchmarks::WARM_ACCOUNT_PCT,
            crm_years: benchmarks::CRM_YEARS,
            reactivation_rate: benchmarks::REACTIVATION_RATE,
            reactivation_demo_rate: benchmarks::REACTIVATION_DEMO_RATE,
            reactivation_win_rate: benchmarks::REACTIVATION_WIN_RATE,
            linkedin_roi_gain: benchmarks::LINKEDIN_ROI_GAIN,
            google_roi_gain: benchmarks::GOOGLE_ROI_GAIN,
        }
    }
}

// ---------------------------------------------------------------------------
// Params
// ---------------------------------------------------------------------------

/// Everything the engine reads. Missing rate fields deserialize to their
/// benchmark defaults; missing metric fields deserialize to zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Params {
    pub monthly_traffic: f64,
    pub acv: f64,
    pub tam: f64,
    pub linkedin_ad_spend: f64,
    pub google_ad_spend: f64,
    #[serde(flatten)]
    pub rates: ConversionRates,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            monthly_traffic: 0.0,
            acv: 0.0,
            tam: 0.0,
            linkedin_ad_spend: 0.0,
            google_ad_spend: 0.0,
            rates: ConversionRates::default(),
        }
    }
}

impl Params {
    /// Merge the numeric company metrics with a rate set.
    pub fn from_metrics(metrics: &CompanyMetrics, rates: ConversionRates) -> Self {
        Self {
            monthly_traffic: metrics.monthly_traffic,
            acv: metrics.acv,
            tam: metrics.tam,
            linkedin_ad_spend: metrics.linkedin_ad_spend,
            google_ad_spend: metrics.google_ad_spend,
            rates,
        }
    }

    pub fn get(&self, key: ParamKey) -> f64 {
        let r = &self.rates;
        match key {
            ParamKey::MonthlyTraffic => self.monthly_traffic,
            ParamKey::Acv => self.acv,
            ParamKey::Tam => self.tam,
            ParamKey::LinkedinAdSpend => self.linkedin_ad_spend,
            ParamKey::GoogleAdSpend => self.google_ad_spend,
            ParamKey::FormFillRate => r.form_fill_rate,
            ParamKey::FormAbandonRate => r.form_abandon_rate,
            ParamKey::AbandonToDemo => r.abandon_to_demo,
            ParamKey::DemoToDeal => r.demo_to_deal,
            ParamKey::DealWinRate => r.deal_win_rate,
            ParamKey::ColdReachToMeeting => r.cold_reach_to_meeting,
            ParamKey::WarmReachToMeeting => r.warm_reach_to_meeting,
            ParamKey::MeetingToDeal => r.meeting_to_deal,
            ParamKey::DealToClose => r.deal_to_close,
            ParamKey::WarmAccountPct => r.warm_account_pct,
            ParamKey::CrmYears => r.crm_years,
            ParamKey::ReactivationRate => r.reactivation_rate,
            ParamKey::ReactivationDemoRate => r.reactivation_demo_rate,
            ParamKey::ReactivationWinRate => r.reactivation_win_rate,
            ParamKey::LinkedinRoiGain => r.linkedin_roi_gain,
            ParamKey::GoogleRoiGain => r.google_roi_gain,
        }
    }

    /// Replace one field, leaving every other field untouched.
    pub fn set(&mut self, key: ParamKey, value: f64) {
        let r = &mut self.rates;
        let slot = match key {
            ParamKey::MonthlyTraffic => &mut self.monthly_traffic,
            ParamKey::Acv => &mut self.acv,
            ParamKey::Tam => &mut self.tam,
            ParamKey::LinkedinAdSpend => &mut self.linkedin_ad_spend,
            ParamKey::GoogleAdSpend => &mut self.google_ad_spend,
            ParamKey::FormFillRate => &mut r.form_fill_rate,
            ParamKey::FormAbandonRate => &mut r.form_abandon_rate,
            ParamKey::AbandonToDemo => &mut r.abandon_to_demo,
            ParamKey::DemoToDeal => &mut r.demo_to_deal,
            ParamKey::DealWinRate => &mut r.deal_win_rate,
            ParamKey::ColdReachToMeeting => &mut r.cold_reach_to_meeting,
            ParamKey::WarmReachToMeeting => &mut r.warm_reach_to_meeting,
            ParamKey::MeetingToDeal => &mut r.meeting_to_deal,
            ParamKey::DealToClose => &mut r.deal_to_close,
            ParamKey::WarmAccountPct => &mut r.warm_account_pct,
            ParamKey::CrmYears => &mut r.crm_years,
            ParamKey::ReactivationRate => &mut r.reactivation_rate,
            ParamKey::ReactivationDemoRate => &mut r.reactivation_demo_rate,
            ParamKey::ReactivationWinRate => &mut r.reactivation_win_rate,
            ParamKey::LinkedinRoiGain => &mut r.linkedin_roi_gain,
            ParamKey::GoogleRoiGain => &mut r.google_roi_gain,
        };
        *slot = value;
    }

    /// Fields outside their conventional range, in `ParamKey::ALL` order.
    ///
    /// Advisory only: the engine accepts any finite value.
    pub fn out_of_range(&self) -> Vec<(ParamKey, f64)> {
        ParamKey::ALL
            .iter()
            .map(|&key| (key, self.get(key)))
            .filter(|&(key, value)| !key.accepts(value))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Parameter keys
// ---------------------------------------------------------------------------

/// What a parameter's number measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamUnit {
    Percent,
    Currency,
    Count,
    Years,
}

/// Names every field of `Params`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamKey {
    MonthlyTraffic,
    Acv,
    Tam,
    LinkedinAdSpend,
    GoogleAdSpend,
    FormFillRate,
    FormAbandonRate,
    AbandonToDemo,
    DemoToDeal,
    DealWinRate,
    ColdReachToMeeting,
    WarmReachToMeeting,
    MeetingToDeal,
    DealToClose,
    WarmAccountPct,
    CrmYears,
    ReactivationRate,
    ReactivationDemoRate,
    ReactivationWinRate,
    LinkedinRoiGain,
    GoogleRoiGain,
}

impl ParamKey {
    /// All keys, company metrics first, then rates in funnel order.
    pub const ALL: [ParamKey; 21] = [
        ParamKey::MonthlyTraffic,
        ParamKey::Acv,
        ParamKey::Tam,
        ParamKey::LinkedinAdSpend,
        ParamKey::GoogleAdSpend,
        ParamKey::FormFillRate,
        ParamKey::FormAbandonRate,
        ParamKey::AbandonToDemo,
        ParamKey::DemoToDeal,
        ParamKey::DealWinRate,
        ParamKey::ColdReachToMeeting,
        ParamKey::WarmReachToMeeting,
        ParamKey::MeetingToDeal,
        ParamKey::DealToClose,
        ParamKey::WarmAccountPct,
        ParamKey::CrmYears,
        ParamKey::ReactivationRate,
        ParamKey::ReactivationDemoRate,
        ParamKey::ReactivationWinRate,
        ParamKey::LinkedinRoiGain,
        ParamKey::GoogleRoiGain,
    ];

    /// Stable camelCase name, matching the JSON field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKey::MonthlyTraffic => "monthlyTraffic",
            ParamKey::Acv => "acv",
            ParamKey::Tam => "tam",
            ParamKey::LinkedinAdSpend => "linkedinAdSpend",
            ParamKey::GoogleAdSpend => "googleAdSpend",
            ParamKey::FormFillRate => "formFillRate",
            ParamKey::FormAbandonRate => "formAbandonRate",
            ParamKey::AbandonToDemo => "abandonToDemo",
            ParamKey::DemoToDeal => "demoToDeal",
            ParamKey::DealWinRate => "dealWinRate",
            ParamKey::ColdReachToMeeting => "coldReachToMeeting",
            ParamKey::WarmReachToMeeting => "warmReachToMeeting",
            ParamKey::MeetingToDeal => "meetingToDeal",
            ParamKey::DealToClose => "dealToClose",
            ParamKey::WarmAccountPct => "warmAccountPct",
            ParamKey::CrmYears => "crmYears",
            ParamKey::ReactivationRate => "reactivationRate",
            ParamKey::ReactivationDemoRate => "reactivationDemoRate",
            ParamKey::ReactivationWinRate => "reactivationWinRate",
            ParamKey::LinkedinRoiGain => "linkedinRoiGain",
            ParamKey::GoogleRoiGain => "googleRoiGain",
        }
    }

    /// Human-readable label for form fields and reports.
    pub fn label(&self) -> &'static str {
        match self {
            ParamKey::MonthlyTraffic => "Monthly website visitors",
            ParamKey::Acv => "Annual contract value",
            ParamKey::Tam => "Total addressable market (companies)",
            ParamKey::LinkedinAdSpend => "Monthly LinkedIn ad spend",
            ParamKey::GoogleAdSpend => "Monthly Google ad spend",
            ParamKey::FormFillRate => "Form fill rate",
            ParamKey::FormAbandonRate => "Form abandon rate",
            ParamKey::AbandonToDemo => "Abandoned form to demo",
            ParamKey::DemoToDeal => "Demo to deal",
            ParamKey::DealWinRate => "Deal win rate",
            ParamKey::ColdReachToMeeting => "Cold reach to meeting",
            ParamKey::WarmReachToMeeting => "Warm reach to meeting",
            ParamKey::MeetingToDeal => "Meeting to deal",
            ParamKey::DealToClose => "Deal to close",
            ParamKey::WarmAccountPct => "Warm accounts (% of TAM)",
            ParamKey::CrmYears => "CRM lookback",
            ParamKey::ReactivationRate => "Lead reactivation rate",
            ParamKey::ReactivationDemoRate => "Reactivated lead to demo",
            ParamKey::ReactivationWinRate => "Reactivated deal win rate",
            ParamKey::LinkedinRoiGain => "LinkedIn ad efficiency gain",
            ParamKey::GoogleRoiGain => "Google ad efficiency gain",
        }
    }

    pub fn unit(&self) -> ParamUnit {
        match self {
            ParamKey::MonthlyTraffic | ParamKey::Tam => ParamUnit::Count,
            ParamKey::Acv | ParamKey::LinkedinAdSpend | ParamKey::GoogleAdSpend => {
                ParamUnit::Currency
            }
            ParamKey::CrmYears => ParamUnit::Years,
            _ => ParamUnit::Percent,
        }
    }

    /// True for the fields that come from research rather than benchmarks.
    pub fn is_company_metric(&self) -> bool {
        matches!(
            self,
            ParamKey::MonthlyTraffic
                | ParamKey::Acv
                | ParamKey::Tam
                | ParamKey::LinkedinAdSpend
                | ParamKey::GoogleAdSpend
        )
    }

    /// Whether `value` sits inside this field's conventional range:
    /// finite and non-negative, at most 100 for percentages, and a whole
    /// number of at least one for year spans.
    pub fn accepts(&self, value: f64) -> bool {
        if !value.is_finite() || value < 0.0 {
            return false;
        }
        match self.unit() {
            ParamUnit::Percent => value <= 100.0,
            ParamUnit::Years => value >= 1.0 && value.fract() == 0.0,
            _ => true,
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownParamKey(pub String);

impl fmt::Display for UnknownParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown parameter: {}", self.0)
    }
}

impl std::error::Error for UnknownParamKey {}

impl FromStr for ParamKey {
    type Err = UnknownParamKey;

    /// Accepts the camelCase name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ParamKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownParamKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_round_trips_through_its_name() {
        for key in ParamKey::ALL {
            assert_eq!(key.as_str().parse::<ParamKey>(), Ok(key));
        }
        assert_eq!("FORMFILLRATE".parse::<ParamKey>(), Ok(ParamKey::FormFillRate));
        assert!("formFill".parse::<ParamKey>().is_err());
    }

    #[test]
    fn set_touches_only_one_field() {
        let before = Params::default();
        let mut after = before.clone();
        after.set(ParamKey::DemoToDeal, 42.0);

        for key in ParamKey::ALL {
            if key == ParamKey::DemoToDeal {
                assert_eq!(after.get(key), 42.0);
            } else {
                assert_eq!(after.get(key), before.get(key), "{} changed", key);
            }
        }
    }

    #[test]
    fn json_names_match_key_names() {
        let json = serde_json::to_value(Params::default()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), ParamKey::ALL.len());
        for key in ParamKey::ALL {
            assert!(obj.contains_key(key.as_str()), "missing {}", key);
        }
    }

    #[test]
    fn missing_rates_deserialize_to_benchmarks() {
        let params: Params =
            serde_json::from_str(r#"{"monthlyTraffic": 1000, "formFillRate": 2}"#).unwrap();
        assert_eq!(params.monthly_traffic, 1000.0);
        assert_eq!(params.acv, 0.0);
        assert_eq!(params.rates.form_fill_rate, 2.0);
        assert_eq!(params.rates.demo_to_deal, benchmarks::DEMO_TO_DEAL);
    }

    #[test]
    fn out_of_range_flags_negatives_and_big_percentages() {
        let mut params = Params::default();
        params.set(ParamKey::Acv, -5.0);
        params.set(ParamKey::DealWinRate, 140.0);
        params.set(ParamKey::Tam, 2_000_000.0);

        let flagged: Vec<ParamKey> = params.out_of_range().into_iter().map(|(k, _)| k).collect();
        assert_eq!(flagged, vec![ParamKey::Acv, ParamKey::DealWinRate]);
    }

    #[test]
    fn crm_years_must_be_a_whole_positive_span() {
        assert!(ParamKey::CrmYears.accepts(5.0));
        assert!(ParamKey::CrmYears.accepts(1.0));
        assert!(!ParamKey::CrmYears.accepts(0.0));
        assert!(!ParamKey::CrmYears.accepts(2.5));

        let mut params = Params::default();
        params.set(ParamKey::CrmYears, 0.0);
        assert_eq!(params.out_of_range(), vec![(ParamKey::CrmYears, 0.0)]);
    }

    #[test]
    fn confidence_uses_lowercase_wire_names() {
        let c: Confidence = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(c, Confidence::High);
        assert_eq!(serde_json::to_string(&Confidence::Low).unwrap(), "\"low\"");
    }
}
