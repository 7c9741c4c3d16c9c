//! CSV batch estimation.
//!
//! Expected CSV columns:
//!   company, monthly_traffic, acv, tam, linkedin_ad_spend, google_ad_spend
//!
//! Ad spend columns may be blank. Every row is estimated against the
//! default conversion rates.

use std::io::Read;
use std::path::Path;

use rayon::prelude::*;
use serde::Deserialize;
use warmbound_funnel::{compute_roi_with, ConversionRates, EngineConfig, Params, RoiResult};

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Failed to open '{path}': {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV parse error at line {line}: {source}")]
    Parse { line: usize, source: csv::Error },
}

/// One company's metrics as read from CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyRow {
    pub company: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub monthly_traffic: f64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub acv: f64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub tam: f64,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub linkedin_ad_spend: f64,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub google_ad_spend: f64,
}

impl CompanyRow {
    pub fn params(&self) -> Params {
        Params {
            monthly_traffic: self.monthly_traffic,
            acv: self.acv,
            tam: self.tam,
            linkedin_ad_spend: self.linkedin_ad_spend,
            google_ad_spend: self.google_ad_spend,
            rates: ConversionRates::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchEstimate {
    pub company: String,
    pub params: Params,
    pub result: RoiResult,
}

/// Load company rows from a CSV reader.
pub fn load_companies<R: Read>(reader: R) -> Result<Vec<CompanyRow>, BatchError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let row: CompanyRow = result.map_err(|source| BatchError::Parse {
            line: line_num + 2,
            source,
        })?;
        rows.push(row);
    }

    Ok(rows)
}

/// Load company rows from a CSV file path.
pub fn load_companies_file(path: &Path) -> Result<Vec<CompanyRow>, BatchError> {
    let file = std::fs::File::open(path).map_err(|source| BatchError::Open {
        path: path.display().to_string(),
        source,
    })?;
    load_companies(file)
}

/// Estimate every row in parallel. Output order matches input order.
pub fn estimate_all(rows: &[CompanyRow], engine: &EngineConfig) -> Vec<BatchEstimate> {
    rows.par_iter()
        .map(|row| {
            let params = row.params();
            BatchEstimate {
                company: row.company.clone(),
                result: compute_roi_with(&params, engine),
                params,
            }
        })
        .collect()
}

/// Flexible amount deserializer: blank is zero, `$` and `,` are ignored.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ','))
        .collect();
    if cleaned.is_empty() {
        return Ok(0.0);
    }
    cleaned.parse::<f64>().map_err(|_| {
        serde::de::Error::custom(format!("expected a number, got '{}'", s))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
company,monthly_traffic,acv,tam,linkedin_ad_spend,google_ad_spend
Acme,50000,\"$20,000\",5000,10000,8000
Globex,120000,45000,12000,,
Initech,0,15000,0,0,2500
";

    #[test]
    fn load_sample_csv() {
        let rows = load_companies(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].company, "Acme");
        assert_eq!(rows[0].acv, 20_000.0);
        assert_eq!(rows[1].linkedin_ad_spend, 0.0);
    }

    #[test]
    fn bad_number_reports_line() {
        let csv = "company,monthly_traffic,acv,tam\nAcme,lots,1,1\n";
        let err = load_companies(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn missing_ad_spend_columns_default_to_zero() {
        let csv = "company,monthly_traffic,acv,tam\nAcme,50000,20000,5000\n";
        let rows = load_companies(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].google_ad_spend, 0.0);
    }

    #[test]
    fn estimates_keep_input_order_and_match_engine() {
        let rows = load_companies(SAMPLE_CSV.as_bytes()).unwrap();
        let estimates = estimate_all(&rows, &EngineConfig::default());

        let names: Vec<_> = estimates.iter().map(|e| e.company.as_str()).collect();
        assert_eq!(names, ["Acme", "Globex", "Initech"]);

        let acme = &estimates[0].result;
        assert!((acme.warmbound.pipeline - 480_000.0).abs() < 1e-6);
        assert!((acme.total_ad_savings - 33_600.0).abs() < 1e-6);

        let initech = &estimates[2].result;
        assert_eq!(initech.warmbound.pipeline, 0.0);
        assert_eq!(initech.form_abandonment.pipeline, 0.0);
    }
}
