//! Row Source Loader Module
//! Reads raw rows from the positions collection export or a delimited price file.

use polars::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Native column names of the positions collection.
pub mod position_columns {
    pub const TITLE: &str = "Titulo";
    pub const QUANTITY: &str = "Qtd";
    pub const CURRENT_POSITION: &str = "Posição Atual";
    pub const DATE: &str = "Data";
}

/// Native column names of the Tesouro Direto price file.
pub mod price_columns {
    pub const TITLE_TYPE: &str = "Tipo Titulo";
    pub const MATURITY_DATE: &str = "Data Vencimento";
    pub const BASE_DATE: &str = "Data Base";
    pub const PURCHASE_RATE: &str = "Taxa Compra Manha";
    pub const SELL_RATE: &str = "Taxa Venda Manha";
    pub const PURCHASE_PRICE: &str = "PU Compra Manha";
    pub const SELL_PRICE: &str = "PU Venda Manha";
    pub const BASE_PRICE: &str = "PU Base Manha";
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load table: {0}")]
    Polars(#[from] PolarsError),
    #[error("Source not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed document at {path}:{line}: {source}")]
    Document {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid number '{value}' in field {field}")]
    Number { field: &'static str, value: String },
    #[error("No data loaded from {0}")]
    NoData(String),
}

/// Anything that can produce a raw table with the source's native columns.
pub trait RowSource {
    /// Stable descriptor used for logging and as the cache key.
    fn describe(&self) -> String;

    /// Read every row; no type coercion beyond what the source stores natively.
    fn load(&self) -> Result<DataFrame, LoaderError>;
}

/// Delimited text file read with every column as `String`.
#[derive(Debug, Clone)]
pub struct DelimitedSource {
    pub path: PathBuf,
    pub separator: u8,
}

impl DelimitedSource {
    pub fn new(path: impl Into<PathBuf>, separator: u8) -> Self {
        Self {
            path: path.into(),
            separator,
        }
    }

    /// Tesouro Direto publishes its price history separated by `;`.
    pub fn semicolon(path: impl Into<PathBuf>) -> Self {
        Self::new(path, b';')
    }
}

impl RowSource for DelimitedSource {
    fn describe(&self) -> String {
        format!("csv:{}:{}", self.path.display(), self.separator as char)
    }

    fn load(&self) -> Result<DataFrame, LoaderError> {
        ensure_exists(&self.path)?;

        // Schema inference off: locale decimals must reach the normalizer as text
        let df = LazyCsvReader::new(&self.path)
            .with_has_header(true)
            .with_separator(self.separator)
            .with_infer_schema_length(Some(0))
            .with_encoding(CsvEncoding::LossyUtf8)
            .finish()?
            .collect()?;

        if df.width() == 0 {
            return Err(LoaderError::NoData(self.describe()));
        }

        info!(source = %self.describe(), rows = df.height(), "loaded delimited file");
        Ok(df)
    }
}

/// JSON export of the positions document collection.
///
/// Both a JSON array and newline-delimited documents are accepted.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    pub path: PathBuf,
}

impl DocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_documents(&self) -> Result<Vec<PositionDocument>, LoaderError> {
        let text = fs::read_to_string(&self.path).map_err(|source| LoaderError::Io {
            path: self.path.clone(),
            source,
        })?;

        if text.trim_start().starts_with('[') {
            return serde_json::from_str(&text).map_err(|source| LoaderError::Document {
                path: self.path.clone(),
                line: source.line(),
                source,
            });
        }

        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|source| LoaderError::Document {
                    path: self.path.clone(),
                    line: i + 1,
                    source,
                })
            })
            .collect()
    }
}

impl RowSource for DocumentSource {
    fn describe(&self) -> String {
        format!("documents:{}", self.path.display())
    }

    fn load(&self) -> Result<DataFrame, LoaderError> {
        ensure_exists(&self.path)?;
        let docs = self.read_documents()?;
        if docs.is_empty() {
            return Err(LoaderError::NoData(self.describe()));
        }
        debug!(documents = docs.len(), "parsed collection export");

        let mut titles: Vec<String> = Vec::with_capacity(docs.len());
        let mut quantities: Vec<f64> = Vec::with_capacity(docs.len());
        let mut positions: Vec<f64> = Vec::with_capacity(docs.len());
        let mut dates: Vec<String> = Vec::with_capacity(docs.len());

        for doc in docs {
            quantities.push(doc.quantity.value(position_columns::QUANTITY)?);
            positions.push(doc.current_position.value(position_columns::CURRENT_POSITION)?);
            titles.push(doc.title);
            dates.push(doc.date.into_text());
        }

        let df = DataFrame::new(vec![
            Column::new(position_columns::TITLE.into(), titles),
            Column::new(position_columns::QUANTITY.into(), quantities),
            Column::new(position_columns::CURRENT_POSITION.into(), positions),
            Column::new(position_columns::DATE.into(), dates),
        ])?;

        info!(source = %self.describe(), rows = df.height(), "loaded document collection");
        Ok(df)
    }
}

fn ensure_exists(path: &Path) -> Result<(), LoaderError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(LoaderError::NotFound(path.to_path_buf()))
    }
}

/// One document of the `Tesouro` collection; `_id` and extra fields are ignored.
#[derive(Debug, Deserialize)]
struct PositionDocument {
    #[serde(rename = "Titulo")]
    title: String,
    #[serde(rename = "Qtd")]
    quantity: NumberField,
    #[serde(rename = "Posição Atual")]
    current_position: NumberField,
    #[serde(rename = "Data")]
    date: DateField,
}

/// Plain JSON number or extended JSON (`{"$numberDouble": "1.5"}`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberField {
    Plain(f64),
    Extended(HashMap<String, String>),
}

impl NumberField {
    fn value(&self, field: &'static str) -> Result<f64, LoaderError> {
        match self {
            NumberField::Plain(v) => Ok(*v),
            NumberField::Extended(map) => {
                let raw = map.values().next().cloned().unwrap_or_default();
                match raw.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(v),
                    _ => Err(LoaderError::Number { field, value: raw }),
                }
            }
        }
    }
}

/// Plain string or extended JSON (`{"$date": "2024-10-03T00:00:00Z"}`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DateField {
    Text(String),
    Extended {
        #[serde(rename = "$date")]
        date: String,
    },
}

impl DateField {
    fn into_text(self) -> String {
        match self {
            DateField::Text(s) => s,
            DateField::Extended { date } => date,
        }
    }
}
