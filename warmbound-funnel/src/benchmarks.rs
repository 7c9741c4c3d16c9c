//! Industry-benchmark defaults for every conversion rate.
//!
//! Percentages are stored on a 0-100 scale. Changing a value here changes
//! the starting point of every freshly seeded parameter set, but never the
//! values a user has already edited.

/// Share of annual site visitors who start a conversion form.
pub const FORM_FILL_RATE: f64 = 0.5;

/// Share of started forms that are abandoned before submission.
pub const FORM_ABANDON_RATE: f64 = 67.0;

/// Share of abandoned forms recovered into a booked demo.
pub const ABANDON_TO_DEMO: f64 = 5.0;

/// Share of demos that become a qualified deal. Shared by the form
/// recovery and CRM reactivation funnels.
pub const DEMO_TO_DEAL: f64 = 30.0;

/// Win rate on deals recovered from abandoned forms.
pub const DEAL_WIN_RATE: f64 = 20.0;

/// Meeting rate for blind outreach.
pub const COLD_REACH_TO_MEETING: f64 = 2.0;

/// Meeting rate for outreach at accounts showing buying intent.
pub const WARM_REACH_TO_MEETING: f64 = 10.0;

pub const MEETING_TO_DEAL: f64 = 40.0;

/// Close rate applied to warmbound pipeline.
pub const DEAL_TO_CLOSE: f64 = 20.0;

/// Share of the addressable market showing intent at any given time.
pub const WARM_ACCOUNT_PCT: f64 = 15.0;

/// Years of dormant leads sitting in the CRM.
pub const CRM_YEARS: f64 = 5.0;

pub const REACTIVATION_RATE: f64 = 10.0;

pub const REACTIVATION_DEMO_RATE: f64 = 7.0;

pub const REACTIVATION_WIN_RATE: f64 = 15.0;

/// Efficiency gain on LinkedIn ad spend from intent-based targeting.
pub const LINKEDIN_ROI_GAIN: f64 = 20.0;

/// Efficiency gain on Google ad spend from intent-based targeting.
pub const GOOGLE_ROI_GAIN: f64 = 10.0;

/// Months per year, used to annualize monthly traffic and spend.
pub const MONTHS_PER_YEAR: f64 = 12.0;
