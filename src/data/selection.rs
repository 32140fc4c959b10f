//! Selection Module
//! The filter step driven by the user's series and date-range choices.

use crate::data::locale::epoch_days;
use crate::data::table::date_span;
use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

pub const EMPTY_SELECTION_WARNING: &str = "Select at least one title";
pub const EMPTY_TABLE_WARNING: &str = "No rows available to filter";

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// What the user picked: series keys and up to two date endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub series: Vec<String>,
    pub range: Vec<NaiveDate>,
}

impl Selection {
    pub fn new(series: Vec<String>, range: Vec<NaiveDate>) -> Self {
        Self { series, range }
    }
}

/// Inclusive date interval actually applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateBounds {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Outcome of the filter step.
#[derive(Debug, Clone)]
pub enum Filtered {
    /// Nothing to filter; the presenter shows the message instead of a table.
    Warning(String),
    Table { table: DataFrame, bounds: DateBounds },
}

impl Filtered {
    pub fn table(&self) -> Option<&DataFrame> {
        match self {
            Filtered::Table { table, .. } => Some(table),
            Filtered::Warning(_) => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Filtered::Warning(msg) => Some(msg),
            Filtered::Table { .. } => None,
        }
    }
}

/// Resolve the picked endpoints against the available `(min, max)` dates.
///
/// A range collapsed to one endpoint runs from that endpoint to the latest
/// available date. No endpoints means the whole span.
pub fn resolve_range(endpoints: &[NaiveDate], available: (NaiveDate, NaiveDate)) -> DateBounds {
    let (min, max) = available;
    match endpoints {
        [] => DateBounds { from: min, to: max },
        [only] => {
            warn!(from = %only, to = %max, "date range has one endpoint; using latest date as end");
            DateBounds {
                from: *only,
                to: max,
            }
        }
        [a, b, ..] => DateBounds {
            from: *a.min(b),
            to: *a.max(b),
        },
    }
}

fn date_lit(date: NaiveDate) -> Expr {
    lit(epoch_days(date)).cast(DataType::Date)
}

/// Keep rows whose `key_column` is selected and whose `date_column` lies in range.
pub fn apply(
    df: &DataFrame,
    key_column: &str,
    date_column: &str,
    selection: &Selection,
) -> Result<Filtered, SelectionError> {
    if selection.series.is_empty() {
        return Ok(Filtered::Warning(EMPTY_SELECTION_WARNING.to_string()));
    }
    let Some(available) = date_span(df, date_column)? else {
        return Ok(Filtered::Warning(EMPTY_TABLE_WARNING.to_string()));
    };

    let bounds = resolve_range(&selection.range, available);

    let key_pred = selection
        .series
        .iter()
        .map(|key| col(key_column).eq(lit(key.as_str())))
        .reduce(|acc, e| acc.or(e))
        .unwrap_or_else(|| lit(false));
    let date_pred = col(date_column)
        .gt_eq(date_lit(bounds.from))
        .and(col(date_column).lt_eq(date_lit(bounds.to)));

    let table = df
        .clone()
        .lazy()
        .filter(key_pred.and(date_pred))
        .collect()?;

    debug!(
        series = selection.series.len(),
        from = %bounds.from,
        to = %bounds.to,
        rows = table.height(),
        "applied selection"
    );
    Ok(Filtered::Table { table, bounds })
}
