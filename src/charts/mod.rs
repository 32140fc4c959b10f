//! Charts module - Static chart export

mod renderer;

pub use renderer::{ChartColumns, ChartError, ChartSeries, LineChartRenderer};
