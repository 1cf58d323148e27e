//! Query engine over the session tables: rankings and client lookups.
//!
//! Both entry points share the same filter model: a list of equality or
//! set-membership predicates over named columns. A predicate that matches no
//! rows yields an empty table, never an error — callers rely on "no rows"
//! meaning "no data".

pub mod lookup;
pub mod rank;

pub use lookup::{lookup, LookupQuery};
pub use rank::{rank, RankQuery};

use polars::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("a ranking needs at least one group-by column")]
    EmptyGroupKey,

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// One equality or membership predicate.
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub value: FilterValue,
}

#[derive(Debug, Clone)]
pub enum FilterValue {
    Eq(String),
    In(Vec<String>),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<String>) -> Self {
        Self {
            column: column.to_string(),
            value: FilterValue::Eq(value.into()),
        }
    }

    pub fn is_in(column: &str, values: &[String]) -> Self {
        Self {
            column: column.to_string(),
            value: FilterValue::In(values.to_vec()),
        }
    }
}

pub(crate) fn validate_columns<'a>(
    df: &DataFrame,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), QueryError> {
    for name in names {
        if !df.schema().contains(name) {
            return Err(QueryError::UnknownColumn(name.to_string()));
        }
    }
    Ok(())
}

/// Chain every predicate onto the frame. Rows must match ALL of them.
pub(crate) fn apply_filters(mut lf: LazyFrame, filters: &[Filter]) -> LazyFrame {
    for filter in filters {
        let predicate = match &filter.value {
            FilterValue::Eq(value) => col(filter.column.as_str()).eq(lit(value.clone())),
            FilterValue::In(values) => {
                let members = Series::new("members".into(), values.to_vec());
                col(filter.column.as_str()).is_in(lit(members))
            }
        };
        lf = lf.filter(predicate);
    }
    lf
}

/// Stable descending sort: ties keep their existing relative order.
pub(crate) fn sort_desc(lf: LazyFrame, column: &str) -> LazyFrame {
    lf.sort(
        [column],
        SortMultipleOptions::default()
            .with_order_descending(true)
            .with_maintain_order(true),
    )
}
