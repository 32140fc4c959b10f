//! Stats module - Metric cards

mod metrics;

pub use metrics::{metric_cards, MetricCard};
