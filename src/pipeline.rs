//! Pipelines
//! Cached load + normalize per source, then the aggregation each dashboard consumes.

use crate::data::cache::{self, stage_key};
use crate::data::columns;
use crate::data::{Aggregator, LoaderError, NormalizeError, Normalizer, RowSource};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

const POSITIONS_STAGE: &str = "positions";
const PRICES_STAGE: &str = "prices";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Which price column the price dashboard plots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PriceMetric {
    /// Purchase rate (`Taxa Compra Manha`)
    #[default]
    Rate,
    /// Purchase unit price (`PU Compra Manha`)
    Value,
}

impl PriceMetric {
    pub fn column(self) -> &'static str {
        match self {
            PriceMetric::Rate => columns::RATE,
            PriceMetric::Value => columns::VALUE,
        }
    }
}

/// Positions dashboard: per-title profit series from the document collection.
pub struct PositionPipeline;

impl PositionPipeline {
    /// Normalized positions, loaded at most once per process until refreshed.
    pub fn normalized(source: &dyn RowSource) -> Result<DataFrame, PipelineError> {
        let key = stage_key(&source.describe(), POSITIONS_STAGE);
        cache::global().get_or_load(&key, || {
            let raw = source.load()?;
            Ok::<_, PipelineError>(Normalizer::positions(&raw)?)
        })
    }

    /// The table the positions dashboard renders.
    pub fn run(source: &dyn RowSource) -> Result<DataFrame, PipelineError> {
        let normalized = Self::normalized(source)?;
        Ok(Aggregator::profit_by_title(&normalized)?)
    }

    pub fn daily_totals(source: &dyn RowSource) -> Result<DataFrame, PipelineError> {
        let normalized = Self::normalized(source)?;
        Ok(Aggregator::daily_totals(&normalized)?)
    }
}

/// Price dashboard: purchase rate/price history from the delimited file.
pub struct PricePipeline;

impl PricePipeline {
    pub fn normalized(source: &dyn RowSource) -> Result<DataFrame, PipelineError> {
        let key = stage_key(&source.describe(), PRICES_STAGE);
        cache::global().get_or_load(&key, || {
            let raw = source.load()?;
            Ok::<_, PipelineError>(Normalizer::prices(&raw)?)
        })
    }

    /// Rows ordered for the price table.
    pub fn display(source: &dyn RowSource) -> Result<DataFrame, PipelineError> {
        let normalized = Self::normalized(source)?;
        Ok(Aggregator::display_order(&normalized)?)
    }

    /// Rows ordered for the filter/select step and the charts.
    pub fn run(source: &dyn RowSource) -> Result<DataFrame, PipelineError> {
        let normalized = Self::normalized(source)?;
        Ok(Aggregator::filter_order(&normalized)?)
    }
}

/// Forget one source's cached tables.
pub fn invalidate(source: &dyn RowSource) -> bool {
    let descriptor = source.describe();
    let mut cache = cache::global();
    let a = cache.invalidate(&stage_key(&descriptor, POSITIONS_STAGE));
    let b = cache.invalidate(&stage_key(&descriptor, PRICES_STAGE));
    a || b
}

/// Drop every cached table so the next run re-reads its source.
pub fn refresh() {
    info!("refreshing all sources");
    cache::global().clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::f64_values;
    use std::cell::Cell;

    /// In-memory source counting how often it is read.
    struct CountingSource {
        name: &'static str,
        table: DataFrame,
        loads: Cell<usize>,
    }

    impl CountingSource {
        fn new(name: &'static str, table: DataFrame) -> Self {
            Self {
                name,
                table,
                loads: Cell::new(0),
            }
        }
    }

    impl RowSource for CountingSource {
        fn describe(&self) -> String {
            format!("memory:{}", self.name)
        }

        fn load(&self) -> Result<DataFrame, LoaderError> {
            self.loads.set(self.loads.get() + 1);
            Ok(self.table.clone())
        }
    }

    fn raw_positions() -> DataFrame {
        df!(
            "Titulo" => ["A", "A"],
            "Qtd" => [1.0, 1.0],
            "Posição Atual" => [100.0, 150.0],
            "Data" => ["2024-01-01", "2024-01-02"]
        )
        .unwrap()
    }

    #[test]
    fn positions_run_yields_profit_and_hits_cache() {
        let source = CountingSource::new("pipeline-positions", raw_positions());

        let out = PositionPipeline::run(&source).unwrap();
        assert_eq!(f64_values(&out, columns::PROFIT).unwrap(), vec![None, Some(50.0)]);

        PositionPipeline::run(&source).unwrap();
        PositionPipeline::daily_totals(&source).unwrap();
        assert_eq!(source.loads.get(), 1);

        assert!(invalidate(&source));
        PositionPipeline::run(&source).unwrap();
        assert_eq!(source.loads.get(), 2);
    }

    #[test]
    fn normalize_failure_is_not_cached() {
        let bad = df!(
            "Titulo" => ["A"],
            "Qtd" => [1.0],
            "Posição Atual" => [1.0],
            "Data" => ["not a date"]
        )
        .unwrap();
        let source = CountingSource::new("pipeline-bad", bad);

        assert!(matches!(
            PositionPipeline::run(&source),
            Err(PipelineError::Normalize(NormalizeError::Parse { .. }))
        ));
        assert!(PositionPipeline::run(&source).is_err());
        assert_eq!(source.loads.get(), 2);
    }

    #[test]
    fn price_metric_maps_to_columns() {
        assert_eq!(PriceMetric::Rate.column(), "Rate");
        assert_eq!(PriceMetric::Value.column(), "Value");
        assert_eq!(PriceMetric::default(), PriceMetric::Rate);
    }
}
