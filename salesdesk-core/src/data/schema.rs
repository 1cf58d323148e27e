//! Canonical column names and load-boundary column mapping.
//!
//! The upstream spreadsheets address business keys through literal display
//! strings ("SP Outsider", "Sub Acct Name"). Those strings live here and
//! nowhere else: downstream code refers to the `columns` constants, and
//! source-side renames are confined to a [`ColumnMap`] applied at load time.

use polars::prelude::*;
use thiserror::Error;

/// Canonical column names shared by the sales tables.
pub mod columns {
    pub const ACCOUNT: &str = "Account";
    pub const SUB_ACCT_NAME: &str = "Sub Acct Name";
    pub const OFFICE_ADDRESS: &str = "Office Address";
    pub const CITY: &str = "City";
    pub const STATE: &str = "State";
    pub const ZIP: &str = "Zip";
    pub const TICKER: &str = "Ticker";
    pub const AUM: &str = "AUM";
    pub const DATE: &str = "Date";

    /// External wholesaler, structured-products channel.
    pub const SP_OUTSIDER: &str = "SP Outsider";
    /// External wholesaler, ETF channel.
    pub const ETF_OUTSIDER: &str = "ETF Outsider";
    /// External wholesaler, UIT channel.
    pub const COM_OUTSIDER: &str = "COM Outsider";
    /// Internal wholesaler.
    pub const WHOLESALER: &str = "Wholesaler";

    /// Shareholder-filing export columns (pre-rename).
    pub const SYMBOL: &str = "Symbol";
    pub const MARKET_VALUE: &str = "Market Value";
    pub const HOLDING_TYPE: &str = "Type";
}

/// Display headers for ETF client grids.
pub const ETF_DISPLAY_COLUMNS: [&str; 12] = [
    columns::ACCOUNT,
    columns::SUB_ACCT_NAME,
    columns::OFFICE_ADDRESS,
    columns::CITY,
    columns::STATE,
    columns::ZIP,
    columns::TICKER,
    columns::AUM,
    columns::SP_OUTSIDER,
    columns::ETF_OUTSIDER,
    columns::COM_OUTSIDER,
    columns::WHOLESALER,
];

/// Display headers for UIT client grids (UIT channel column leads).
pub const UIT_DISPLAY_COLUMNS: [&str; 12] = [
    columns::ACCOUNT,
    columns::SUB_ACCT_NAME,
    columns::OFFICE_ADDRESS,
    columns::CITY,
    columns::STATE,
    columns::ZIP,
    columns::TICKER,
    columns::AUM,
    columns::COM_OUTSIDER,
    columns::SP_OUTSIDER,
    columns::ETF_OUTSIDER,
    columns::WHOLESALER,
];

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing required column: {0}")]
    MissingColumn(String),
}

/// Schema checks for loaded sales tables.
pub struct SalesSchema;

impl SalesSchema {
    /// Verify that every required column is present.
    pub fn validate(df: &DataFrame, required: &[&str]) -> Result<(), SchemaError> {
        let actual = df.schema();
        for name in required {
            if !actual.contains(name) {
                return Err(SchemaError::MissingColumn((*name).to_string()));
            }
        }
        Ok(())
    }
}

/// Ordered rename table applied at the load boundary.
///
/// Only columns actually present in the table are renamed; absent entries are
/// skipped so one map can serve several vintages of the same export.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    renames: Vec<(String, String)>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rename(mut self, from: &str, to: &str) -> Self {
        self.renames.push((from.to_string(), to.to_string()));
        self
    }

    /// Apply the renames to a table.
    pub fn apply(&self, df: DataFrame) -> PolarsResult<DataFrame> {
        let present: Vec<&(String, String)> = self
            .renames
            .iter()
            .filter(|(from, _)| df.schema().contains(from))
            .collect();
        if present.is_empty() {
            return Ok(df);
        }
        let existing: Vec<String> = present.iter().map(|(from, _)| from.clone()).collect();
        let new: Vec<String> = present.iter().map(|(_, to)| to.clone()).collect();
        df.lazy().rename(existing, new, true).collect()
    }
}

/// Rename table for the shareholder-filing export.
pub fn filing_column_map() -> ColumnMap {
    ColumnMap::new().rename(columns::SYMBOL, columns::TICKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_present_columns() {
        let df = df!(
            "Ticker" => &["AAA"],
            "AUM" => &[100.0],
        )
        .unwrap();
        assert!(SalesSchema::validate(&df, &[columns::TICKER, columns::AUM]).is_ok());
    }

    #[test]
    fn validate_rejects_missing_column() {
        let df = df!("Ticker" => &["AAA"]).unwrap();
        let err = SalesSchema::validate(&df, &[columns::TICKER, columns::AUM]).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn(c) if c == "AUM"));
    }

    #[test]
    fn column_map_renames_present_columns_only() {
        let df = df!(
            "Symbol" => &["AAA"],
            "Market Value" => &[100i64],
        )
        .unwrap();
        let mapped = filing_column_map()
            .rename("Nonexistent", "Whatever")
            .apply(df)
            .unwrap();
        assert!(mapped.schema().contains(columns::TICKER));
        assert!(!mapped.schema().contains(columns::SYMBOL));
    }

    #[test]
    fn column_map_noop_when_nothing_matches() {
        let df = df!("Ticker" => &["AAA"]).unwrap();
        let mapped = filing_column_map().apply(df.clone()).unwrap();
        assert!(mapped.equals(&df));
    }
}
