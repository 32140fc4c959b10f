//! Tesouro - Tesouro Direto dashboards in the terminal
//!
//! ```bash
//! # Portfolio evolution from a collection export
//! tesouro positions --source tesouro.json --from 03/10/2024
//!
//! # Purchase rate history, two bonds, chart to PNG
//! tesouro prices --source PrecoTaxaTesouroDireto.csv -t "Tesouro Selic 2029" \
//!     -t "Tesouro IPCA+ 2035" --chart rates.png
//! ```

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tesouro_dash::config::DashboardConfig;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = DashboardConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Positions(args) => commands::positions(args, &config, cli.format)?,
        Commands::Prices(args) => commands::prices(args, &config, cli.format)?,
    }

    Ok(())
}
