//! Tesouro Dash - Tesouro Direto position & price pipelines
//!
//! Loads the positions collection export and the price history file, normalizes
//! Brazilian-formatted values, and produces the tables, metric cards and charts
//! the dashboards display.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod stats;

pub use pipeline::{PipelineError, PositionPipeline, PriceMetric, PricePipeline};
