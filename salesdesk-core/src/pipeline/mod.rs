//! Session-build pipeline: roster joins and product-family segmentation

pub mod join;
pub mod segment;

pub use join::build_unified_uit;
pub use segment::{filter_by_ticker_set, ProductFamilies};

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}
