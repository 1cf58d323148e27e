//! Product-family segmentation of the ETF master table.

use super::PipelineError;
use crate::data::schema::columns;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// The two standing ETF product families, configured externally.
///
/// Membership is a fixed partition key, never derived from the data itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductFamilies {
    pub buffer_etf_tickers: Vec<String>,
    pub target_income_etf_tickers: Vec<String>,
}

impl ProductFamilies {
    /// True if the ticker belongs to the buffer family.
    pub fn is_buffer(&self, ticker: &str) -> bool {
        self.buffer_etf_tickers.iter().any(|t| t == ticker)
    }
}

/// Keep only rows whose ticker is in the given set.
///
/// Row order is preserved and nothing is deduplicated; the result is never
/// larger than the input.
pub fn filter_by_ticker_set(
    df: &DataFrame,
    tickers: &[String],
) -> Result<DataFrame, PipelineError> {
    if !df.schema().contains(columns::TICKER) {
        return Err(PipelineError::MissingColumn(columns::TICKER.to_string()));
    }
    let members = Series::new("tickers".into(), tickers.to_vec());
    let filtered = df
        .clone()
        .lazy()
        .filter(col(columns::TICKER).is_in(lit(members)))
        .collect()?;
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn etf_table() -> DataFrame {
        df!(
            "Ticker" => &["AAA", "BBB", "AAA", "CCC"],
            "AUM" => &[1.0, 2.0, 3.0, 4.0],
        )
        .unwrap()
    }

    fn set(tickers: &[&str]) -> Vec<String> {
        tickers.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn keeps_only_members_in_order() {
        let filtered = filter_by_ticker_set(&etf_table(), &set(&["AAA", "CCC"])).unwrap();
        let tickers = filtered.column("Ticker").unwrap().str().unwrap();
        assert_eq!(filtered.height(), 3);
        assert_eq!(tickers.get(0), Some("AAA"));
        assert_eq!(tickers.get(1), Some("AAA"));
        assert_eq!(tickers.get(2), Some("CCC"));
    }

    #[test]
    fn duplicate_member_rows_are_kept() {
        let filtered = filter_by_ticker_set(&etf_table(), &set(&["AAA"])).unwrap();
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn empty_set_yields_empty_table() {
        let filtered = filter_by_ticker_set(&etf_table(), &[]).unwrap();
        assert_eq!(filtered.height(), 0);
        assert!(filtered.schema().contains("AUM"));
    }

    #[test]
    fn family_membership_check() {
        let families = ProductFamilies {
            buffer_etf_tickers: set(&["AAA"]),
            target_income_etf_tickers: set(&["BBB"]),
        };
        assert!(families.is_buffer("AAA"));
        assert!(!families.is_buffer("BBB"));
    }
}
