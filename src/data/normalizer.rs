//! Normalizer Module
//! Turns raw source tables into typed tables with the dashboard's column names.

use crate::data::loader::{position_columns as raw_pos, price_columns as raw_price};
use crate::data::locale::{parse_day_first, parse_decimal, parse_flexible_date, LocaleError};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

/// Column names of normalized and aggregated tables.
pub mod columns {
    pub const TITLE: &str = "Title";
    pub const QUANTITY: &str = "Quantity";
    pub const CURRENT_POSITION: &str = "CurrentPosition";
    pub const DATE: &str = "Date";
    pub const PROFIT: &str = "Profit";

    pub const LABEL: &str = "Label";
    pub const MATURITY_YEAR: &str = "MaturityYear";
    pub const BASE_DATE: &str = "BaseDate";
    pub const MATURITY_DATE: &str = "MaturityDate";
    pub const RATE: &str = "Rate";
    pub const VALUE: &str = "Value";
}

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("Column '{column}' has unsupported type {dtype}")]
    UnexpectedType { column: &'static str, dtype: DataType },
    #[error("Row {row}, column '{column}': {source}")]
    Parse {
        row: usize,
        column: &'static str,
        #[source]
        source: LocaleError,
    },
    #[error("Row {row}, column '{column}': missing value")]
    Null { row: usize, column: &'static str },
    #[error("Row {row}, column '{column}': value is not a finite number")]
    NonFinite { row: usize, column: &'static str },
}

/// Stateless raw-to-typed conversions. Same raw input, same output.
pub struct Normalizer;

impl Normalizer {
    /// Positions collection → `[Title, Quantity, CurrentPosition, Date]`.
    pub fn positions(raw: &DataFrame) -> Result<DataFrame, NormalizeError> {
        let title = require(raw, raw_pos::TITLE)?.strict_cast(&DataType::String)?;
        let quantity = require(raw, raw_pos::QUANTITY)?.strict_cast(&DataType::Float64)?;
        let position = require(raw, raw_pos::CURRENT_POSITION)?.strict_cast(&DataType::Float64)?;
        let dates = position_dates(require(raw, raw_pos::DATE)?)?;

        if let Some(row) = first_null(&title) {
            return Err(NormalizeError::Null { row, column: raw_pos::TITLE });
        }
        if let Some(row) = first_null(&position) {
            return Err(NormalizeError::Null {
                row,
                column: raw_pos::CURRENT_POSITION,
            });
        }
        for (column, values) in [
            (raw_pos::QUANTITY, &quantity),
            (raw_pos::CURRENT_POSITION, &position),
        ] {
            if let Some(row) = first_non_finite(values)? {
                return Err(NormalizeError::NonFinite { row, column });
            }
        }

        let df = DataFrame::new(vec![
            title.with_name(columns::TITLE.into()).into(),
            quantity.with_name(columns::QUANTITY.into()).into(),
            position.with_name(columns::CURRENT_POSITION.into()).into(),
            Column::new(columns::DATE.into(), dates),
        ])?;

        debug!(rows = df.height(), "normalized positions");
        Ok(df)
    }

    /// Price file → `[Title, Label, MaturityYear, BaseDate, MaturityDate, Rate, Value]`.
    ///
    /// Sell-side and base-PU columns are dropped; they are never displayed.
    pub fn prices(raw: &DataFrame) -> Result<DataFrame, NormalizeError> {
        let title_col = require(raw, raw_price::TITLE_TYPE)?;
        let maturity_col = require(raw, raw_price::MATURITY_DATE)?;
        let base_col = require(raw, raw_price::BASE_DATE)?;
        let rate_col = require(raw, raw_price::PURCHASE_RATE)?;
        let price_col = require(raw, raw_price::PURCHASE_PRICE)?;

        let title_ca = title_col.str()?;
        let maturity_ca = maturity_col.str()?;
        let base_ca = base_col.str()?;
        let rate_ca = rate_col.str()?;
        let price_ca = price_col.str()?;

        let n = raw.height();
        let mut titles: Vec<String> = Vec::with_capacity(n);
        let mut labels: Vec<String> = Vec::with_capacity(n);
        let mut years: Vec<String> = Vec::with_capacity(n);
        let mut base_dates: Vec<NaiveDate> = Vec::with_capacity(n);
        let mut maturity_dates: Vec<NaiveDate> = Vec::with_capacity(n);
        let mut rates: Vec<f64> = Vec::with_capacity(n);
        let mut values: Vec<f64> = Vec::with_capacity(n);

        for row in 0..n {
            let title = cell(title_ca.get(row), row, raw_price::TITLE_TYPE)?.trim();
            let maturity = parse_cell(
                maturity_ca.get(row),
                row,
                raw_price::MATURITY_DATE,
                parse_day_first,
            )?;
            let base = parse_cell(base_ca.get(row), row, raw_price::BASE_DATE, parse_day_first)?;
            let rate = parse_cell(rate_ca.get(row), row, raw_price::PURCHASE_RATE, parse_decimal)?;
            let value = parse_cell(
                price_ca.get(row),
                row,
                raw_price::PURCHASE_PRICE,
                parse_decimal,
            )?;

            let year = maturity.year().to_string();
            labels.push(format!("{title} {year}"));
            titles.push(title.to_string());
            years.push(year);
            base_dates.push(base);
            maturity_dates.push(maturity);
            rates.push(rate);
            values.push(value);
        }

        let df = DataFrame::new(vec![
            Column::new(columns::TITLE.into(), titles),
            Column::new(columns::LABEL.into(), labels),
            Column::new(columns::MATURITY_YEAR.into(), years),
            Column::new(columns::BASE_DATE.into(), base_dates),
            Column::new(columns::MATURITY_DATE.into(), maturity_dates),
            Column::new(columns::RATE.into(), rates),
            Column::new(columns::VALUE.into(), values),
        ])?;

        debug!(
            rows = df.height(),
            dropped = ?[raw_price::SELL_RATE, raw_price::SELL_PRICE, raw_price::BASE_PRICE],
            "normalized prices"
        );
        Ok(df)
    }
}

fn require<'a>(df: &'a DataFrame, name: &'static str) -> Result<&'a Series, NormalizeError> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| NormalizeError::MissingColumn(name))
}

fn first_null(series: &Series) -> Option<usize> {
    if series.null_count() == 0 {
        return None;
    }
    let nulls = series.is_null();
    let first = nulls.into_iter().position(|v| v == Some(true)).map(|i| i + 1);
    first
}

fn first_non_finite(series: &Series) -> Result<Option<usize>, NormalizeError> {
    let ca = series.f64()?;
    Ok(ca
        .into_iter()
        .position(|v| v.is_some_and(|v| !v.is_finite()))
        .map(|i| i + 1))
}

fn cell<'a>(
    value: Option<&'a str>,
    row: usize,
    column: &'static str,
) -> Result<&'a str, NormalizeError> {
    value.ok_or(NormalizeError::Null { row: row + 1, column })
}

fn parse_cell<T>(
    value: Option<&str>,
    row: usize,
    column: &'static str,
    parse: fn(&str) -> Result<T, LocaleError>,
) -> Result<T, NormalizeError> {
    let text = cell(value, row, column)?;
    parse(text).map_err(|source| NormalizeError::Parse {
        row: row + 1,
        column,
        source,
    })
}

/// The collection stores dates as text, but an already-typed column is accepted.
fn position_dates(series: &Series) -> Result<Vec<NaiveDate>, NormalizeError> {
    match series.dtype() {
        DataType::String => {
            let ca = series.str()?;
            (0..ca.len())
                .map(|row| parse_cell(ca.get(row), row, raw_pos::DATE, parse_flexible_date))
                .collect()
        }
        DataType::Date | DataType::Datetime(_, _) => {
            let dates = series.cast(&DataType::Date)?;
            let ca = dates.date()?;
            ca.as_date_iter()
                .enumerate()
                .map(|(row, d)| {
                    d.ok_or(NormalizeError::Null {
                        row: row + 1,
                        column: raw_pos::DATE,
                    })
                })
                .collect()
        }
        other => Err(NormalizeError::UnexpectedType {
            column: raw_pos::DATE,
            dtype: other.clone(),
        }),
    }
}
