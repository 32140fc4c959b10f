//! Static Chart Renderer
//! Writes the dashboard's line charts (one line per series over time) as PNG.

use crate::data::locale::epoch_days;
use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use polars::prelude::{DataFrame, DataType, PolarsError, PolarsResult};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Nothing to plot")]
    Empty,
    #[error("Drawing failed: {0}")]
    Draw(String),
}

fn draw_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}

/// One line: x in days since epoch, y the plotted value.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<(i32, f64)>,
}

/// Columns mapped to the chart's axes and colour.
#[derive(Debug, Clone, Copy)]
pub struct ChartColumns<'a> {
    pub title: &'a str,
    pub x: &'a str,
    pub y: &'a str,
    pub color: &'a str,
}

pub struct LineChartRenderer;

impl LineChartRenderer {
    /// Split a table into per-series points, dropping rows with a null value.
    pub fn series_from_table(
        df: &DataFrame,
        axes: &ChartColumns<'_>,
    ) -> PolarsResult<Vec<ChartSeries>> {
        let keys_col = df.column(axes.color)?.as_materialized_series();
        let dates_col = df.column(axes.x)?.as_materialized_series();
        let values_col = df
            .column(axes.y)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;

        let keys = keys_col.str()?;
        let dates = dates_col.date()?;
        let values = values_col.f64()?;

        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut series: Vec<ChartSeries> = Vec::new();

        for ((key, date), value) in keys
            .into_iter()
            .zip(dates.as_date_iter())
            .zip(values.into_iter())
        {
            let (Some(key), Some(date), Some(value)) = (key, date, value) else {
                continue;
            };
            let slot = *index.entry(key).or_insert_with(|| {
                series.push(ChartSeries {
                    name: key.to_string(),
                    points: Vec::new(),
                });
                series.len() - 1
            });
            series[slot].points.push((epoch_days(date), value));
        }

        for s in &mut series {
            s.points.sort_by_key(|p| p.0);
        }
        Ok(series)
    }

    /// Y range with 15% padding, `(0, 100)` when there is no data.
    pub fn value_range(series: &[ChartSeries]) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for (_, v) in series.iter().flat_map(|s| s.points.iter()) {
            if v.is_finite() {
                min = min.min(*v);
                max = max.max(*v);
            }
        }
        if min.is_infinite() {
            return (0.0, 100.0);
        }
        let pad = ((max - min) * 0.15).max(1e-6);
        (min - pad, max + pad)
    }

    /// X range in days; a single day is widened so the axis is never empty.
    pub fn day_range(series: &[ChartSeries]) -> Option<(i32, i32)> {
        let xs = series.iter().flat_map(|s| s.points.iter().map(|p| p.0));
        let min = xs.clone().min()?;
        let max = xs.max()?;
        Some(if min == max { (min - 1, max + 1) } else { (min, max) })
    }

    pub fn format_day(days: i32) -> String {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
        (epoch + Duration::days(days as i64))
            .format("%d/%m/%Y")
            .to_string()
    }

    /// Render `df` to a PNG at `path`.
    pub fn render_png(
        df: &DataFrame,
        axes: &ChartColumns<'_>,
        path: &Path,
        size: (u32, u32),
    ) -> Result<(), ChartError> {
        let series = Self::series_from_table(df, axes)?;
        let (x_min, x_max) = Self::day_range(&series).ok_or(ChartError::Empty)?;
        let (y_min, y_max) = Self::value_range(&series);

        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(axes.title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_labels(6)
            .x_label_formatter(&|x| Self::format_day(*x))
            .x_desc(axes.x)
            .y_desc(axes.y)
            .draw()
            .map_err(draw_err)?;

        for (i, s) in series.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            chart
                .draw_series(LineSeries::new(
                    s.points.iter().copied(),
                    color.stroke_width(2),
                ))
                .map_err(draw_err)?
                .label(s.name.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        info!(path = %path.display(), series = series.len(), "chart written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    const COLUMNS: ChartColumns<'static> = ChartColumns {
        title: "Rate",
        x: "BaseDate",
        y: "Rate",
        color: "Label",
    };

    #[test]
    fn splits_series_in_first_seen_order() {
        let df = df!(
            "Label" => ["B", "A", "B", "A"],
            "BaseDate" => [d(2), d(1), d(1), d(2)],
            "Rate" => [Some(2.0), Some(10.0), Some(1.0), None]
        )
        .unwrap();

        let series = LineChartRenderer::series_from_table(&df, &COLUMNS).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "B");
        assert_eq!(
            series[0].points,
            vec![(epoch_days(d(1)), 1.0), (epoch_days(d(2)), 2.0)]
        );
        assert_eq!(series[1].points, vec![(epoch_days(d(1)), 10.0)]);
    }

    #[test]
    fn ranges_are_padded_and_never_empty() {
        let series = vec![ChartSeries {
            name: "A".into(),
            points: vec![(10, 100.0)],
        }];
        assert_eq!(LineChartRenderer::day_range(&series), Some((9, 11)));
        let (lo, hi) = LineChartRenderer::value_range(&series);
        assert!(lo < 100.0 && hi > 100.0);

        assert_eq!(LineChartRenderer::day_range(&[]), None);
        assert_eq!(LineChartRenderer::value_range(&[]), (0.0, 100.0));
    }

    #[test]
    fn day_labels_are_day_first() {
        assert_eq!(LineChartRenderer::format_day(epoch_days(d(5))), "05/01/2024");
    }

    #[test]
    fn renders_two_series_to_png() {
        let df = df!(
            "Label" => ["Tesouro Selic 2029", "Tesouro IPCA+ 2035", "Tesouro Selic 2029", "Tesouro IPCA+ 2035"],
            "BaseDate" => [d(2), d(2), d(3), d(3)],
            "Rate" => [0.12, 5.8, 0.13, 5.75]
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.png");

        LineChartRenderer::render_png(&df, &COLUMNS, &path, (400, 300)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.len() > 8);
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn empty_table_cannot_be_rendered() {
        let df = df!(
            "Label" => Vec::<String>::new(),
            "BaseDate" => Vec::<NaiveDate>::new(),
            "Rate" => Vec::<f64>::new()
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = LineChartRenderer::render_png(&df, &COLUMNS, &dir.path().join("x.png"), (400, 300))
            .unwrap_err();
        assert!(matches!(err, ChartError::Empty));
    }
}
