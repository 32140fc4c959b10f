//! Dashboard configuration file.
//!
//! Optional JSON file holding source locations and defaults. Command-line
//! flags and environment variables take precedence over it.

use crate::pipeline::PriceMetric;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_DELIMITER: char = ';';
pub const DEFAULT_CHART_SIZE: (u32, u32) = (1200, 700);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Delimiter must be a single ASCII character, got '{0}'")]
    InvalidDelimiter(char),
    #[error("No {0} source configured (flag, environment or config file)")]
    MissingSource(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// JSON export of the positions collection.
    pub positions: Option<PathBuf>,
    /// Delimited price history file.
    pub prices: Option<PathBuf>,
    pub delimiter: Option<char>,
    pub metric: Option<PriceMetric>,
    pub chart_size: Option<(u32, u32)>,
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map(Self::from_file)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    pub fn positions_source(&self, flag: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        flag.or_else(|| self.positions.clone())
            .ok_or(ConfigError::MissingSource("positions"))
    }

    pub fn prices_source(&self, flag: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        flag.or_else(|| self.prices.clone())
            .ok_or(ConfigError::MissingSource("prices"))
    }

    /// Delimiter as the byte the CSV reader expects.
    pub fn delimiter(&self, flag: Option<char>) -> Result<u8, ConfigError> {
        let c = flag.or(self.delimiter).unwrap_or(DEFAULT_DELIMITER);
        if c.is_ascii() {
            Ok(c as u8)
        } else {
            Err(ConfigError::InvalidDelimiter(c))
        }
    }

    pub fn metric(&self, flag: Option<PriceMetric>) -> PriceMetric {
        flag.or(self.metric).unwrap_or_default()
    }

    pub fn chart_size(&self) -> (u32, u32) {
        self.chart_size.unwrap_or(DEFAULT_CHART_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_partial_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"prices": "data/precos.csv", "metric": "value"}}"#).unwrap();

        let cfg = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.prices, Some(PathBuf::from("data/precos.csv")));
        assert_eq!(cfg.metric(None), PriceMetric::Value);
        assert_eq!(cfg.delimiter(None).unwrap(), b';');
        assert_eq!(cfg.chart_size(), DEFAULT_CHART_SIZE);
    }

    #[test]
    fn flags_override_file() {
        let cfg = DashboardConfig {
            prices: Some("a.csv".into()),
            delimiter: Some(','),
            metric: Some(PriceMetric::Value),
            ..Default::default()
        };
        assert_eq!(cfg.prices_source(Some("b.csv".into())).unwrap(), PathBuf::from("b.csv"));
        assert_eq!(cfg.delimiter(Some('\t')).unwrap(), b'\t');
        assert_eq!(cfg.metric(Some(PriceMetric::Rate)), PriceMetric::Rate);
    }

    #[test]
    fn missing_source_and_bad_delimiter() {
        let cfg = DashboardConfig::default();
        assert!(matches!(
            cfg.positions_source(None),
            Err(ConfigError::MissingSource("positions"))
        ));
        assert!(matches!(
            cfg.delimiter(Some('§')),
            Err(ConfigError::InvalidDelimiter('§'))
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"prices": "p.csv", "colour": "blue"}}"#).unwrap();
        assert!(matches!(
            DashboardConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(DashboardConfig::load(None).unwrap(), DashboardConfig::default());
    }
}
