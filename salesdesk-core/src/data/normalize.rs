//! Schema normalization across heterogeneous spreadsheet sources.
//!
//! Sources disagree on column spellings and date types; these helpers align
//! them to the canonical schema right after loading, so the join pipeline and
//! query engine only ever see one shape.

use super::source::DataError;
use polars::prelude::*;

/// Month-key format shared by every reporting-period column.
pub const MONTH_KEY_FORMAT: &str = "%m-%Y";

/// Normalize a reporting-date column to a month-key string ("MM-YYYY").
///
/// Date and datetime columns are rendered; string columns are assumed to
/// already carry month keys and pass through untouched.
pub fn normalize_dates(df: DataFrame, column: &str) -> Result<DataFrame, DataError> {
    let dtype = df
        .column(column)
        .map_err(|_| DataError::MissingColumn(column.to_string()))?
        .dtype()
        .clone();

    match dtype {
        DataType::Date | DataType::Datetime(_, _) => df
            .lazy()
            .with_column(col(column).dt().to_string(MONTH_KEY_FORMAT).alias(column))
            .collect()
            .map_err(|e| DataError::MalformedTable(e.to_string())),
        DataType::String => Ok(df),
        other => Err(DataError::MalformedTable(format!(
            "column '{column}' has unexpected dtype {other:?}, expected a date or string"
        ))),
    }
}

/// Drop the `*_right` columns a join leaves behind on name collisions.
///
/// The left side's values win, and they already carry the unqualified names.
pub fn drop_right_duplicates(df: DataFrame) -> DataFrame {
    let collisions: Vec<String> = df
        .get_column_names()
        .iter()
        .filter(|name| name.as_str().ends_with("_right"))
        .map(|name| name.to_string())
        .collect();
    if collisions.is_empty() {
        df
    } else {
        df.drop_many(collisions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn date_column_becomes_month_key() {
        let dates = [
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
        ];
        let df = df!("Date" => &dates).unwrap();

        let normalized = normalize_dates(df, "Date").unwrap();
        let keys = normalized.column("Date").unwrap().str().unwrap();
        assert_eq!(keys.get(0), Some("03-2024"));
        assert_eq!(keys.get(1), Some("11-2024"));
    }

    #[test]
    fn string_column_passes_through() {
        let df = df!("Date" => &["03-2024"]).unwrap();
        let normalized = normalize_dates(df.clone(), "Date").unwrap();
        assert!(normalized.equals(&df));
    }

    #[test]
    fn numeric_date_column_is_rejected() {
        let df = df!("Date" => &[20240315i64]).unwrap();
        assert!(matches!(
            normalize_dates(df, "Date"),
            Err(DataError::MalformedTable(_))
        ));
    }

    #[test]
    fn missing_column_is_reported() {
        let df = df!("Ticker" => &["AAA"]).unwrap();
        assert!(matches!(
            normalize_dates(df, "Date"),
            Err(DataError::MissingColumn(_))
        ));
    }

    #[test]
    fn right_collision_columns_are_dropped() {
        let df = df!(
            "City" => &["NYC"],
            "City_right" => &["Albany"],
            "State_right" => &["NY"],
        )
        .unwrap();

        let cleaned = drop_right_duplicates(df);
        assert!(cleaned.schema().contains("City"));
        assert!(!cleaned.schema().contains("City_right"));
        assert!(!cleaned.schema().contains("State_right"));
    }
}
