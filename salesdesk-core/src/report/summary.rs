//! Holdings summary: shareholder-filing export joined against a ticker list,
//! rendered as a downloadable text blob.

use super::format::group_thousands;
use crate::data::schema::{columns, filing_column_map};
use crate::query::{sort_desc, validate_columns, QueryError};
use polars::prelude::*;

/// Generate the holdings summary text.
///
/// The ticker list is the base side of a left join against the filing export
/// (whose `Symbol` column is renamed to `Ticker` at the boundary). Missing
/// market values count as zero and zero-value rows are dropped, so only
/// tickers the filing actually holds survive. One line per surviving row,
/// highest market value first:
///
/// ```text
/// {ticker} {type} ${market_value}
/// ```
///
/// The type field is blank when the holding type is unknown.
pub fn holdings_summary(
    tickers: &DataFrame,
    filing: &DataFrame,
) -> Result<String, QueryError> {
    validate_columns(tickers, [columns::TICKER])?;
    let filing = filing_column_map().apply(filing.clone())?;
    validate_columns(&filing, [columns::TICKER, columns::MARKET_VALUE])?;

    let mut args = JoinArgs::new(JoinType::Left);
    args.maintain_order = MaintainOrderJoin::Left;

    let merged = tickers
        .clone()
        .lazy()
        .join(
            filing.lazy(),
            [col(columns::TICKER)],
            [col(columns::TICKER)],
            args,
        )
        .with_column(
            col(columns::MARKET_VALUE)
                .fill_null(lit(0))
                .cast(DataType::Int64),
        )
        .collect()?;
    validate_columns(&merged, [columns::HOLDING_TYPE])?;

    let sliced = merged
        .lazy()
        .select([
            col(columns::TICKER),
            col(columns::MARKET_VALUE),
            col(columns::HOLDING_TYPE),
        ])
        .filter(col(columns::TICKER).is_not_null())
        .filter(col(columns::MARKET_VALUE).neq(lit(0)));
    let sorted = sort_desc(sliced, columns::MARKET_VALUE).collect()?;

    let ticker_col = sorted.column(columns::TICKER)?.str()?;
    let value_col = sorted.column(columns::MARKET_VALUE)?.i64()?;
    let type_col = sorted.column(columns::HOLDING_TYPE)?.str()?;

    let mut lines = Vec::with_capacity(sorted.height());
    for i in 0..sorted.height() {
        let ticker = ticker_col.get(i).unwrap_or("");
        let holding_type = type_col.get(i).unwrap_or("");
        let value = value_col.get(i).unwrap_or(0);
        lines.push(format!(
            "{ticker} {holding_type} ${}",
            group_thousands(value)
        ));
    }
    Ok(lines.join("\n"))
}
