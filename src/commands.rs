//! Command implementations for the two dashboards.

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tesouro_dash::charts::{ChartColumns, LineChartRenderer};
use tesouro_dash::config::DashboardConfig;
use tesouro_dash::data::columns;
use tesouro_dash::data::selection::{self, Selection};
use tesouro_dash::data::table::{date_span, unique_in_order};
use tesouro_dash::data::{DelimitedSource, DocumentSource, Filtered};
use tesouro_dash::stats::metric_cards;
use tesouro_dash::{PositionPipeline, PricePipeline};
use tracing::info;

use crate::cli::{FilterArgs, OutputFormat, PositionsArgs, PricesArgs};
use crate::output::{print_sections, Section};

/// Apply the user's filter. Without `--title` every series in the table is selected.
fn filter_table(filter: &FilterArgs, table: &DataFrame, key: &str, date: &str) -> Result<Filtered> {
    let Some((earliest, _)) = date_span(table, date)? else {
        return Ok(Filtered::Warning(selection::EMPTY_TABLE_WARNING.to_string()));
    };
    let series = if filter.titles.is_empty() {
        unique_in_order(table, key)?
    } else {
        filter.titles.clone()
    };
    let sel = Selection::new(series, filter.endpoints(Some(earliest)));
    Ok(selection::apply(table, key, date, &sel)?)
}

fn write_chart(
    filter: &FilterArgs,
    config: &DashboardConfig,
    filtered: &Filtered,
    axes: ChartColumns<'_>,
) -> Result<()> {
    let (Some(path), Some(table)) = (&filter.chart, filtered.table()) else {
        return Ok(());
    };
    LineChartRenderer::render_png(table, &axes, path, config.chart_size())
        .with_context(|| format!("writing chart {}", path.display()))
}

pub fn positions(
    args: PositionsArgs,
    config: &DashboardConfig,
    format: OutputFormat,
) -> Result<()> {
    let path = config.positions_source(args.source)?;
    let source = DocumentSource::new(path);
    info!(source = %source.path.display(), "positions dashboard");

    let table = PositionPipeline::run(&source).context("running positions pipeline")?;
    let filtered = filter_table(&args.filter, &table, columns::TITLE, columns::DATE)?;

    let cards = match filtered.table() {
        Some(t) => metric_cards(t, columns::TITLE, columns::DATE, columns::CURRENT_POSITION)?,
        None => Vec::new(),
    };

    write_chart(
        &args.filter,
        config,
        &filtered,
        ChartColumns {
            title: "Evolução Tesouro Diário",
            x: columns::DATE,
            y: columns::CURRENT_POSITION,
            color: columns::TITLE,
        },
    )?;

    let totals;
    let mut sections = vec![Section {
        title: "Posição por título",
        filtered: &filtered,
        cards: &cards,
    }];

    if args.totals {
        let daily = PositionPipeline::daily_totals(&source)?;
        totals = match date_span(&daily, columns::DATE)? {
            Some(span) => Filtered::Table {
                bounds: selection::resolve_range(&[], span),
                table: daily,
            },
            None => Filtered::Warning(selection::EMPTY_TABLE_WARNING.to_string()),
        };
        sections.push(Section {
            title: "Total diário",
            filtered: &totals,
            cards: &[],
        });
    }

    print_sections(&sections, format)
}

pub fn prices(args: PricesArgs, config: &DashboardConfig, format: OutputFormat) -> Result<()> {
    let path = config.prices_source(args.source)?;
    let source = DelimitedSource::new(path, config.delimiter(args.delimiter)?);
    let metric = config.metric(args.metric);
    info!(source = %source.path.display(), ?metric, "prices dashboard");

    let table = PricePipeline::run(&source).context("running prices pipeline")?;
    let filtered = filter_table(&args.filter, &table, columns::LABEL, columns::BASE_DATE)?;

    let cards = match filtered.table() {
        Some(t) => metric_cards(t, columns::LABEL, columns::BASE_DATE, metric.column())?,
        None => Vec::new(),
    };

    write_chart(
        &args.filter,
        config,
        &filtered,
        ChartColumns {
            title: "Tesouro Direto",
            x: columns::BASE_DATE,
            y: metric.column(),
            color: columns::LABEL,
        },
    )?;

    let catalog;
    let mut sections = vec![Section {
        title: metric.column(),
        filtered: &filtered,
        cards: &cards,
    }];

    if args.catalog {
        let display = PricePipeline::display(&source)?;
        catalog = match date_span(&display, columns::BASE_DATE)? {
            Some(span) => Filtered::Table {
                bounds: selection::resolve_range(&[], span),
                table: display,
            },
            None => Filtered::Warning(selection::EMPTY_TABLE_WARNING.to_string()),
        };
        sections.push(Section {
            title: "Títulos",
            filtered: &catalog,
            cards: &[],
        });
    }

    print_sections(&sections, format)
}
