//! Compact display strings for derivation traces and reports.
//!
//! These never feed back into arithmetic; the engine keeps full precision
//! and only renders numbers when it writes a derivation line.

const THOUSAND: f64 = 1_000.0;
const MILLION: f64 = 1_000_000.0;

/// Rendered for NaN and infinities.
const NOT_A_NUMBER: &str = "n/a";

/// `$1.7M`, `$480K`, `$950`.
pub fn format_currency(amount: f64) -> String {
    abbreviate(amount, "$")
}

/// `1.7M`, `480K`, `950`.
pub fn format_count(count: f64) -> String {
    abbreviate(count, "")
}

/// `0.5%`, `20%`.
pub fn format_percent(pct: f64) -> String {
    if !pct.is_finite() {
        return NOT_A_NUMBER.to_string();
    }
    format!("{}%", pct)
}

fn abbreviate(value: f64, prefix: &str) -> String {
    if !value.is_finite() {
        return NOT_A_NUMBER.to_string();
    }
    let magnitude = value.abs();

    // Round first so a value just under a threshold that rounds up to it
    // is shown in the next tier ($999,999 -> $1.0M, not $1000K).
    let units = magnitude.round();
    // A negative that rounds to zero renders as plain zero.
    let sign = if value < 0.0 && units > 0.0 { "-" } else { "" };
    if units < THOUSAND {
        return format!("{}{}{:.0}", sign, prefix, units);
    }

    let thousands = (magnitude / THOUSAND).round();
    if thousands < THOUSAND {
        return format!("{}{}{:.0}K", sign, prefix, thousands);
    }

    let millions = (magnitude / MILLION * 10.0).round() / 10.0;
    format!("{}{}{:.1}M", sign, prefix, millions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_tiers() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(950.0), "$950");
        assert_eq!(format_currency(1_000.0), "$1K");
        assert_eq!(format_currency(480_000.0), "$480K");
        assert_eq!(format_currency(1_713_000.0), "$1.7M");
        assert_eq!(format_currency(12_250_000.0), "$12.3M");
    }

    #[test]
    fn rounding_promotes_to_the_next_tier() {
        assert_eq!(format_currency(999.6), "$1K");
        assert_eq!(format_currency(999_999.0), "$1.0M");
        assert_eq!(format_count(999_499.0), "999K");
    }

    #[test]
    fn counts_have_no_symbol() {
        assert_eq!(format_count(30.15), "30");
        assert_eq!(format_count(600_000.0), "600K");
        assert_eq!(format_count(2_500_000.0), "2.5M");
    }

    #[test]
    fn negatives_keep_their_sign() {
        assert_eq!(format_currency(-480_000.0), "-$480K");
        assert_eq!(format_count(-12.0), "-12");
    }

    #[test]
    fn negatives_rounding_to_zero_drop_the_sign() {
        assert_eq!(format_currency(-0.3), "$0");
        assert_eq!(format_count(-0.4), "0");
        assert_eq!(format_currency(-0.6), "-$1");
    }

    #[test]
    fn non_finite_renders_placeholder() {
        assert_eq!(format_currency(f64::NAN), "n/a");
        assert_eq!(format_count(f64::INFINITY), "n/a");
        assert_eq!(format_percent(f64::NEG_INFINITY), "n/a");
    }

    #[test]
    fn percent_uses_shortest_form() {
        assert_eq!(format_percent(0.5), "0.5%");
        assert_eq!(format_percent(20.0), "20%");
        assert_eq!(format_percent(67.0), "67%");
    }
}
