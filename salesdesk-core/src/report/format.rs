//! Currency display formatting for result grids.
//!
//! Formatting is a boundary concern: the query engine hands back numeric
//! tables, and these helpers dress them up. A formatting failure must never
//! take the page down with it, so [`with_currency_display`] falls back to
//! the raw table.

use polars::prelude::*;

/// Insert thousands separators into a non-negative integer rendering.
pub fn group_thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Render a signed currency amount: `$1,234.56`, `-$1,234.56`.
///
/// Amounts that round to zero at two decimals drop the sign.
pub fn format_dollar_amount(amount: f64) -> String {
    let cents = (amount * 100.0).round();
    let abs_cents = cents.abs() as i64;
    let formatted = format!(
        "${}.{:02}",
        group_thousands(abs_cents / 100),
        abs_cents % 100
    );
    if cents < 0.0 {
        format!("-{formatted}")
    } else {
        formatted
    }
}

/// Replace every float column with its currency-string rendering.
///
/// Covers both the flat ranking (one AUM column) and the pivoted matrix
/// (one float column per ticker). Nulls stay null.
pub fn format_currency_columns(df: &DataFrame) -> PolarsResult<DataFrame> {
    let mut out = df.clone();
    let float_columns: Vec<PlSmallStr> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype() == &DataType::Float64)
        .map(|c| c.name().clone())
        .collect();

    for name in float_columns {
        let ca = out.column(&name)?.f64()?;
        let formatted: StringChunked = ca
            .into_iter()
            .map(|v| v.map(format_dollar_amount))
            .collect();
        out.replace(&name, formatted.into_series().with_name(name.clone()))?;
    }
    Ok(out)
}

/// Currency display with fallback: on any formatting error the unformatted
/// table is returned so rendering can continue.
pub fn with_currency_display(df: DataFrame) -> DataFrame {
    match format_currency_columns(&df) {
        Ok(formatted) => formatted,
        Err(e) => {
            log::warn!("currency formatting failed, showing raw values: {e}");
            df
        }
    }
}
