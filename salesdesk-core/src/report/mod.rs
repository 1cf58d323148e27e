//! Display formatting and generated text reports

pub mod format;
pub mod summary;

pub use format::{format_dollar_amount, with_currency_display};
pub use summary::holdings_summary;
