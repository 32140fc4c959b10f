//! Column access helpers shared by the pipeline stages.

use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashSet;

/// Distinct non-null strings of a column in order of first appearance.
pub fn unique_in_order(df: &DataFrame, column: &str) -> PolarsResult<Vec<String>> {
    let series = df.column(column)?.as_materialized_series();
    let values = series.str()?;
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ordered = Vec::new();
    for v in values.into_iter().flatten() {
        if seen.insert(v) {
            ordered.push(v.to_string());
        }
    }
    Ok(ordered)
}

/// Non-null dates of a `Date` column, in row order.
pub fn date_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<NaiveDate>> {
    let series = df.column(column)?.as_materialized_series();
    Ok(series.date()?.as_date_iter().flatten().collect())
}

/// Values of a `Float64` column, nulls kept as `None`.
pub fn f64_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = df.column(column)?.as_materialized_series();
    Ok(series.f64()?.into_iter().collect())
}

/// Smallest and largest date of a column, `None` for an empty table.
pub fn date_span(df: &DataFrame, column: &str) -> PolarsResult<Option<(NaiveDate, NaiveDate)>> {
    let dates = date_values(df, column)?;
    Ok(dates
        .iter()
        .min()
        .copied()
        .zip(dates.iter().max().copied()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn unique_keeps_first_seen_order() {
        let df = df!("Title" => ["B", "A", "B", "C", "A"]).unwrap();
        assert_eq!(unique_in_order(&df, "Title").unwrap(), vec!["B", "A", "C"]);
    }

    #[test]
    fn date_span_over_date_column() {
        let df = DataFrame::new(vec![Column::new(
            "Date".into(),
            [d(2024, 3, 1), d(2024, 1, 1), d(2024, 2, 1)],
        )])
        .unwrap();
        assert_eq!(
            date_span(&df, "Date").unwrap(),
            Some((d(2024, 1, 1), d(2024, 3, 1)))
        );
        assert_eq!(date_values(&df, "Date").unwrap().len(), 3);
    }

    #[test]
    fn date_span_of_empty_table_is_none() {
        let df = DataFrame::new(vec![Column::new("Date".into(), Vec::<NaiveDate>::new())]).unwrap();
        assert_eq!(date_span(&df, "Date").unwrap(), None);
    }

    #[test]
    fn wrong_dtype_is_an_error() {
        let df = df!("Title" => [1i32, 2]).unwrap();
        assert!(unique_in_order(&df, "Title").is_err());
        assert!(date_values(&df, "Title").is_err());
    }
}
