//! Grouped AUM rankings with optional ticker pivot.

use super::{apply_filters, sort_desc, validate_columns, Filter, QueryError};
use crate::data::schema::columns;
use polars::prelude::*;

/// A ranking request over one product family's table.
///
/// `group_by` columns become the result's key columns; when `pivot_on` is
/// set, that column's distinct values become result columns instead.
#[derive(Debug, Clone)]
pub struct RankQuery {
    pub group_by: Vec<String>,
    pub filters: Vec<Filter>,
    pub pivot_on: Option<String>,
}

impl RankQuery {
    pub fn new(group_by: &[&str]) -> Self {
        Self {
            group_by: group_by.iter().map(|c| c.to_string()).collect(),
            filters: Vec::new(),
            pivot_on: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn pivot_on(mut self, column: &str) -> Self {
        self.pivot_on = Some(column.to_string());
        self
    }
}

/// Compute a ranking: filter, group, sum AUM, sort descending, pivot.
///
/// The sort is stable, so groups with equal sums keep their first-seen
/// order. A filter matching zero rows produces an empty table.
pub fn rank(df: &DataFrame, query: &RankQuery) -> Result<DataFrame, QueryError> {
    if query.group_by.is_empty() {
        return Err(QueryError::EmptyGroupKey);
    }
    validate_columns(
        df,
        query
            .group_by
            .iter()
            .map(String::as_str)
            .chain(query.filters.iter().map(|f| f.column.as_str()))
            .chain(query.pivot_on.as_deref())
            .chain([columns::AUM]),
    )?;

    // The pivot column takes part in grouping so each cell is one group sum.
    let mut key_columns = query.group_by.clone();
    if let Some(pivot_col) = &query.pivot_on {
        if !key_columns.contains(pivot_col) {
            key_columns.push(pivot_col.clone());
        }
    }
    let key_exprs: Vec<Expr> = key_columns.iter().map(|c| col(c.as_str())).collect();

    let filtered = apply_filters(df.clone().lazy(), &query.filters);
    let grouped = filtered
        .group_by_stable(key_exprs)
        .agg([col(columns::AUM).sum()]);
    let ranked = sort_desc(grouped, columns::AUM).collect()?;

    match &query.pivot_on {
        Some(pivot_col) => pivot(&ranked, &query.group_by, pivot_col, columns::AUM),
        None => Ok(ranked),
    }
}

/// Reshape an aggregated table so `on`'s distinct values become columns.
///
/// Distinct pivot values are taken in first-seen (already ranked) order, as
/// are the index rows. Absent index/pivot combinations stay null — a missing
/// sum is not the same thing as a zero sum. The input is aggregated, so each
/// index/pivot pair holds exactly one value.
fn pivot(
    df: &DataFrame,
    index: &[String],
    on: &str,
    values: &str,
) -> Result<DataFrame, QueryError> {
    let mut keys: Vec<String> = Vec::new();
    for key in df.column(on)?.str()?.into_iter().flatten() {
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }

    let index_exprs: Vec<Expr> = index.iter().map(|c| col(c.as_str())).collect();
    let mut out = df
        .clone()
        .lazy()
        .select(index_exprs.clone())
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;

    let mut args = JoinArgs::new(JoinType::Left);
    args.maintain_order = MaintainOrderJoin::Left;

    for key in &keys {
        let mut selection = index_exprs.clone();
        selection.push(col(values).alias(key.as_str()));
        let slice = df
            .clone()
            .lazy()
            .filter(col(on).eq(lit(key.clone())))
            .select(selection)
            .collect()?;
        out = out
            .lazy()
            .join(
                slice.lazy(),
                index_exprs.clone(),
                index_exprs.clone(),
                args.clone(),
            )
            .collect()?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales_table() -> DataFrame {
        df!(
            "Date" => &["06-2024", "06-2024", "06-2024", "06-2024", "05-2024"],
            "SP Outsider" => &["X", "Y", "X", "Z", "X"],
            "Wholesaler" => &["Inner A", "Inner A", "Inner B", "Inner B", "Inner A"],
            "Ticker" => &["AAA", "AAA", "BBB", "AAA", "AAA"],
            "AUM" => &[100.0, 300.0, 200.0, 100.0, 999.0],
        )
        .unwrap()
    }

    #[test]
    fn sums_are_sorted_descending() {
        let query = RankQuery::new(&["SP Outsider"]).filter(Filter::eq("Date", "06-2024"));
        let ranked = rank(&sales_table(), &query).unwrap();

        let sums = ranked.column("AUM").unwrap().f64().unwrap();
        // X: 100 + 200 = 300, Y: 300, Z: 100 — stable tie-break keeps X first.
        assert_eq!(sums.get(0), Some(300.0));
        assert_eq!(sums.get(1), Some(300.0));
        assert_eq!(sums.get(2), Some(100.0));

        let who = ranked.column("SP Outsider").unwrap().str().unwrap();
        assert_eq!(who.get(0), Some("X"));
        assert_eq!(who.get(1), Some("Y"));
        assert_eq!(who.get(2), Some("Z"));
    }

    #[test]
    fn adjacent_rows_never_increase() {
        let query = RankQuery::new(&["SP Outsider", "Ticker"])
            .filter(Filter::eq("Date", "06-2024"));
        let ranked = rank(&sales_table(), &query).unwrap();
        let sums = ranked.column("AUM").unwrap().f64().unwrap();
        for i in 1..ranked.height() {
            assert!(sums.get(i - 1).unwrap() >= sums.get(i).unwrap());
        }
    }

    #[test]
    fn zero_match_filter_yields_empty_table() {
        let query = RankQuery::new(&["SP Outsider"]).filter(Filter::eq("Date", "01-1999"));
        let ranked = rank(&sales_table(), &query).unwrap();
        assert_eq!(ranked.height(), 0);
        assert!(ranked.schema().contains("AUM"));
    }

    #[test]
    fn membership_filter_restricts_rows() {
        let query = RankQuery::new(&["SP Outsider"])
            .filter(Filter::eq("Date", "06-2024"))
            .filter(Filter::is_in("Ticker", &["BBB".to_string()]));
        let ranked = rank(&sales_table(), &query).unwrap();
        assert_eq!(ranked.height(), 1);
        assert_eq!(
            ranked.column("AUM").unwrap().f64().unwrap().get(0),
            Some(200.0)
        );
    }

    #[test]
    fn pivot_spreads_tickers_into_columns() {
        let query = RankQuery::new(&["SP Outsider"])
            .filter(Filter::eq("Date", "06-2024"))
            .pivot_on("Ticker");
        let pivoted = rank(&sales_table(), &query).unwrap();

        assert!(pivoted.schema().contains("AAA"));
        assert!(pivoted.schema().contains("BBB"));

        // Y never sold BBB: that cell is null, not zero.
        let who = pivoted.column("SP Outsider").unwrap().str().unwrap();
        let y_row = (0..pivoted.height())
            .find(|&i| who.get(i) == Some("Y"))
            .unwrap();
        let bbb = pivoted.column("BBB").unwrap().f64().unwrap();
        assert_eq!(bbb.get(y_row), None);
        let aaa = pivoted.column("AAA").unwrap().f64().unwrap();
        assert_eq!(aaa.get(y_row), Some(300.0));
    }

    #[test]
    fn pivot_on_empty_result_is_empty() {
        let query = RankQuery::new(&["SP Outsider"])
            .filter(Filter::eq("Date", "01-1999"))
            .pivot_on("Ticker");
        let pivoted = rank(&sales_table(), &query).unwrap();
        assert_eq!(pivoted.height(), 0);
    }

    #[test]
    fn unknown_column_is_rejected() {
        let query = RankQuery::new(&["No Such Column"]);
        assert!(matches!(
            rank(&sales_table(), &query),
            Err(QueryError::UnknownColumn(_))
        ));
    }

    #[test]
    fn empty_group_key_is_rejected() {
        let query = RankQuery::new(&[]);
        assert!(matches!(
            rank(&sales_table(), &query),
            Err(QueryError::EmptyGroupKey)
        ));
    }
}
