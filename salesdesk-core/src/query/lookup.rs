//! Unaggregated client detail lookups.

use super::{apply_filters, sort_desc, validate_columns, Filter, QueryError};
use polars::prelude::*;

/// A detail-row lookup: filter, sort, project, cap.
#[derive(Debug, Clone)]
pub struct LookupQuery {
    pub filters: Vec<Filter>,
    pub sort_desc_by: String,
    pub top_n: Option<usize>,
    /// Display columns, in grid order. None keeps every column.
    pub display: Option<Vec<String>>,
}

impl LookupQuery {
    pub fn new(sort_desc_by: &str) -> Self {
        Self {
            filters: Vec::new(),
            sort_desc_by: sort_desc_by.to_string(),
            top_n: None,
            display: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    pub fn display(mut self, columns: &[&str]) -> Self {
        self.display = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }
}

/// Return matching detail rows, sorted descending, optionally capped.
///
/// `top_n` truncates AFTER sorting, so the cap keeps the highest rows.
/// Missing cells are rendered as empty strings for display, whatever the
/// column's dtype: columns carrying nulls come back as text, fully populated
/// columns keep their dtype.
pub fn lookup(df: &DataFrame, query: &LookupQuery) -> Result<DataFrame, QueryError> {
    validate_columns(
        df,
        query
            .filters
            .iter()
            .map(|f| f.column.as_str())
            .chain([query.sort_desc_by.as_str()])
            .chain(query.display.iter().flatten().map(String::as_str)),
    )?;

    let filtered = apply_filters(df.clone().lazy(), &query.filters);
    let mut sorted = sort_desc(filtered, &query.sort_desc_by);

    if let Some(display) = &query.display {
        let selection: Vec<Expr> = display.iter().map(|c| col(c.as_str())).collect();
        sorted = sorted.select(selection);
    }

    let mut out = sorted.collect()?;
    if let Some(n) = query.top_n {
        out = out.head(Some(n));
    }

    // Blank-for-null is part of this contract, not the caller's problem. A
    // null Zip must blank like a null wholesaler name, so any column holding
    // nulls is rendered as text first.
    let null_columns: Vec<String> = out
        .get_columns()
        .iter()
        .filter(|c| c.null_count() > 0)
        .map(|c| c.name().to_string())
        .collect();
    if null_columns.is_empty() {
        return Ok(out);
    }
    let fills: Vec<Expr> = null_columns
        .iter()
        .map(|name| col(name.as_str()).cast(DataType::String).fill_null(lit("")))
        .collect();
    let out = out.lazy().with_columns(fills).collect()?;
    Ok(out)
}
