//! Aggregator Module
//! Per-title profit series, daily totals and the price display orderings.

use crate::data::normalizer::columns::{
    BASE_DATE, CURRENT_POSITION, DATE, LABEL, MATURITY_YEAR, PROFIT, TITLE,
};
use crate::data::table::unique_in_order;
use polars::prelude::*;
use tracing::debug;

/// First difference of a column, null on the first row.
fn first_difference(name: &str) -> Expr {
    col(name) - col(name).shift(lit(1))
}

pub struct Aggregator;

impl Aggregator {
    /// Per-title profit series, concatenated in first-seen title order.
    ///
    /// Each title's rows are date-ordered and carry `Profit`, the change in
    /// `CurrentPosition` since that title's previous observation.
    pub fn profit_by_title(df: &DataFrame) -> PolarsResult<DataFrame> {
        let sorted = df
            .clone()
            .lazy()
            .sort([DATE], SortMultipleOptions::default().with_maintain_order(true))
            .collect()?;

        let titles = unique_in_order(&sorted, TITLE)?;
        if titles.is_empty() {
            let mut empty = sorted;
            empty.with_column(Series::full_null(PROFIT.into(), 0, &DataType::Float64))?;
            return Ok(empty);
        }

        let parts: Vec<LazyFrame> = titles
            .iter()
            .map(|title| {
                sorted
                    .clone()
                    .lazy()
                    .filter(col(TITLE).eq(lit(title.as_str())))
                    .with_column(first_difference(CURRENT_POSITION).alias(PROFIT))
            })
            .collect();

        let out = concat(parts, UnionArgs::default())?.collect()?;
        debug!(titles = titles.len(), rows = out.height(), "profit by title");
        Ok(out)
    }

    /// Portfolio total per date with the day-over-day change rounded to cents.
    ///
    /// Not part of the default positions output; kept for consumers that want
    /// the whole-portfolio curve.
    pub fn daily_totals(df: &DataFrame) -> PolarsResult<DataFrame> {
        let out = df
            .clone()
            .lazy()
            .group_by_stable([col(DATE)])
            .agg([col(CURRENT_POSITION).sum()])
            .sort([DATE], SortMultipleOptions::default())
            .with_column(first_difference(CURRENT_POSITION).round(2).alias(PROFIT))
            .collect()?;
        debug!(days = out.height(), "daily totals");
        Ok(out)
    }

    /// Price table ordering for display: label then maturity year, both descending.
    pub fn display_order(df: &DataFrame) -> PolarsResult<DataFrame> {
        df.clone()
            .lazy()
            .sort(
                [LABEL, MATURITY_YEAR],
                SortMultipleOptions::default()
                    .with_order_descending_multi([true, true])
                    .with_maintain_order(true),
            )
            .collect()
    }

    /// Price table ordering fed to the filter step: label then base date, ascending.
    pub fn filter_order(df: &DataFrame) -> PolarsResult<DataFrame> {
        df.clone()
            .lazy()
            .sort(
                [LABEL, BASE_DATE],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()
    }
}
