//! Metric Cards Module
//! First/last value per series over the selected range, with a growth ratio.

use polars::prelude::*;
use serde::Serialize;

/// Summary shown for one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub label: String,
    pub first: f64,
    pub last: f64,
    /// `last / first`; `None` when the ratio is undefined.
    pub growth: Option<f64>,
}

impl MetricCard {
    pub fn new(label: impl Into<String>, first: f64, last: f64) -> Self {
        let growth = if first != 0.0 && first.is_finite() && last.is_finite() {
            Some(last / first)
        } else {
            None
        };
        Self {
            label: label.into(),
            first,
            last,
            growth,
        }
    }

    /// `1.25x`, or `n/a` when there is no usable starting value.
    pub fn delta_text(&self) -> String {
        match self.growth {
            Some(g) => format!("{g:.2}x"),
            None => "n/a".to_string(),
        }
    }

    /// Whether the delta should be highlighted (`off` for `n/a`).
    pub fn delta_enabled(&self) -> bool {
        self.growth.is_some()
    }
}

/// One card per series, in first-seen order.
///
/// `first`/`last` are the earliest and latest non-null values by `date_column`.
pub fn metric_cards(
    df: &DataFrame,
    key_column: &str,
    date_column: &str,
    value_column: &str,
) -> PolarsResult<Vec<MetricCard>> {
    let summary = df
        .clone()
        .lazy()
        .filter(col(value_column).is_not_null())
        .sort([date_column], SortMultipleOptions::default().with_maintain_order(true))
        .group_by_stable([col(key_column)])
        .agg([
            col(value_column).first().alias("first"),
            col(value_column).last().alias("last"),
        ])
        .collect()?;

    let keys = summary.column(key_column)?.as_materialized_series().str()?.clone();
    let firsts = summary.column("first")?.as_materialized_series().cast(&DataType::Float64)?;
    let lasts = summary.column("last")?.as_materialized_series().cast(&DataType::Float64)?;

    let cards = keys
        .into_iter()
        .zip(firsts.f64()?.into_iter())
        .zip(lasts.f64()?.into_iter())
        .filter_map(|((key, first), last)| Some(MetricCard::new(key?, first?, last?)))
        .collect();
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn growth_is_last_over_first() {
        let card = MetricCard::new("A", 100.0, 125.0);
        assert_eq!(card.growth, Some(1.25));
        assert_eq!(card.delta_text(), "1.25x");
        assert!(card.delta_enabled());
    }

    #[test]
    fn zero_or_nan_start_is_not_available() {
        assert_eq!(MetricCard::new("A", 0.0, 10.0).delta_text(), "n/a");
        let card = MetricCard::new("A", f64::NAN, 10.0);
        assert_eq!(card.growth, None);
        assert!(!card.delta_enabled());
    }

    #[test]
    fn cards_follow_date_order_per_series() {
        let df = df!(
            "Title" => ["A", "B", "A", "B", "A"],
            "Date" => [d(3), d(1), d(1), d(2), d(2)],
            "CurrentPosition" => [130.0, 50.0, 100.0, 40.0, 110.0]
        )
        .unwrap();

        let cards = metric_cards(&df, "Title", "Date", "CurrentPosition").unwrap();
        assert_eq!(cards.len(), 2);

        let a = cards.iter().find(|c| c.label == "A").unwrap();
        assert_eq!((a.first, a.last), (100.0, 130.0));
        assert_eq!(a.delta_text(), "1.30x");

        let b = cards.iter().find(|c| c.label == "B").unwrap();
        assert_eq!((b.first, b.last), (50.0, 40.0));
        assert_eq!(b.delta_text(), "0.80x");
    }

    #[test]
    fn null_values_are_skipped() {
        let df = df!(
            "Title" => ["A", "A", "A"],
            "Date" => [d(1), d(2), d(3)],
            "Profit" => [None, Some(5.0), Some(-2.0)]
        )
        .unwrap();
        let cards = metric_cards(&df, "Title", "Date", "Profit").unwrap();
        assert_eq!(cards, vec![MetricCard::new("A", 5.0, -2.0)]);
    }
}
