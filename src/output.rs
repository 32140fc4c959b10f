//! Output formatting for the terminal presenter.

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use polars::prelude::*;
use serde_json::{json, Value};
use tesouro_dash::data::Filtered;
use tesouro_dash::stats::MetricCard;
use tracing::warn;

/// A titled table plus the metric cards computed from it.
pub struct Section<'a> {
    pub title: &'a str,
    pub filtered: &'a Filtered,
    pub cards: &'a [MetricCard],
}

pub fn print_sections(sections: &[Section<'_>], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for section in sections {
                print_table(section);
            }
            Ok(())
        }
        OutputFormat::Json => {
            let doc: Vec<Value> = sections.iter().map(section_json).collect::<Result<_>>()?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(())
        }
    }
}

fn print_table(section: &Section<'_>) {
    println!("── {} ──", section.title);
    match section.filtered {
        Filtered::Warning(msg) => {
            warn!("{msg}");
            println!("⚠ {msg}");
        }
        Filtered::Table { table, bounds } => {
            println!(
                "{} → {}",
                bounds.from.format("%d/%m/%Y"),
                bounds.to.format("%d/%m/%Y")
            );
            println!("{table}");
        }
    }
    for card in section.cards {
        let marker = if card.delta_enabled() { "" } else { " (off)" };
        println!(
            "  {:<32} {:>14.2}   {}{}",
            card.label,
            card.last,
            card.delta_text(),
            marker
        );
    }
    println!();
}

fn section_json(section: &Section<'_>) -> Result<Value> {
    let body = match section.filtered {
        Filtered::Warning(msg) => json!({ "warning": msg }),
        Filtered::Table { table, bounds } => json!({
            "from": bounds.from.to_string(),
            "to": bounds.to.to_string(),
            "rows": rows_json(table)?,
        }),
    };
    let cards: Vec<Value> = section
        .cards
        .iter()
        .map(|c| {
            let mut v = serde_json::to_value(c)?;
            v["delta"] = Value::String(c.delta_text());
            Ok(v)
        })
        .collect::<Result<_, serde_json::Error>>()?;

    Ok(json!({ "title": section.title, "data": body, "metrics": cards }))
}

fn rows_json(table: &DataFrame) -> Result<Value> {
    let mut buf: Vec<u8> = Vec::new();
    let mut df = table.clone();
    JsonWriter::new(&mut buf)
        .with_json_format(JsonFormat::Json)
        .finish(&mut df)
        .context("serializing table")?;
    serde_json::from_slice(&buf).context("re-reading serialized table")
}
