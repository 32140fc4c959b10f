//! CLI argument definitions.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tesouro_dash::data::locale::parse_flexible_date;
use tesouro_dash::PriceMetric;

/// Tesouro Direto portfolio and price dashboards in the terminal
#[derive(Parser, Debug)]
#[command(name = "tesouro", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// JSON config file with source paths and defaults
    #[arg(long, env = "TESOURO_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Portfolio evolution: per-title position and daily profit
    Positions(PositionsArgs),

    /// Purchase rate / unit price history per bond and maturity
    Prices(PricesArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// JSON document with rows and metric cards
    Json,
}

/// Filter choices shared by both dashboards.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Series to show (title for positions, "type year" label for prices). Repeatable; defaults to all.
    #[arg(short, long = "title")]
    pub titles: Vec<String>,

    /// Range start (DD/MM/YYYY or YYYY-MM-DD)
    #[arg(long, value_parser = parse_cli_date)]
    pub from: Option<NaiveDate>,

    /// Range end (DD/MM/YYYY or YYYY-MM-DD); defaults to the latest available date
    #[arg(long, value_parser = parse_cli_date)]
    pub to: Option<NaiveDate>,

    /// Also write a PNG line chart to this path
    #[arg(long)]
    pub chart: Option<PathBuf>,
}

impl FilterArgs {
    /// Endpoints in the shape the selection step expects.
    pub fn endpoints(&self, earliest: Option<NaiveDate>) -> Vec<NaiveDate> {
        match (self.from, self.to, earliest) {
            (Some(from), Some(to), _) => vec![from, to],
            (Some(from), None, _) => vec![from],
            (None, Some(to), Some(min)) => vec![min, to],
            (None, Some(to), None) => vec![to],
            (None, None, _) => Vec::new(),
        }
    }
}

#[derive(Args, Debug)]
pub struct PositionsArgs {
    /// JSON export of the positions collection
    #[arg(long, env = "TESOURO_POSITIONS")]
    pub source: Option<PathBuf>,

    /// Also print the portfolio total per day
    #[arg(long)]
    pub totals: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args, Debug)]
pub struct PricesArgs {
    /// Delimited price history file
    #[arg(long, env = "TESOURO_PRICES")]
    pub source: Option<PathBuf>,

    /// Field delimiter of the price file
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Which price column to chart and summarize
    #[arg(short, long, value_enum)]
    pub metric: Option<PriceMetric>,

    /// Also print the whole price table, newest maturities first
    #[arg(long)]
    pub catalog: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    parse_flexible_date(s).map_err(|e| e.to_string())
}
