//! Locale Parsing Module
//! Brazilian number and date formats as published by Tesouro Direto.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Day-first format used by the price files (`31/12/2024`).
pub const DAY_FIRST_FORMAT: &str = "%d/%m/%Y";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocaleError {
    #[error("Invalid decimal '{0}'")]
    InvalidDecimal(String),
    #[error("Invalid date '{0}'")]
    InvalidDate(String),
}

/// Rewrite a locale decimal (`1.234,56`) into the form `f64::from_str` accepts.
///
/// Thousands separators are stripped before the decimal comma is replaced;
/// doing it the other way round would delete the fractional point.
pub fn normalize_decimal_text(text: &str) -> String {
    text.trim().replace('.', "").replace(',', ".")
}

/// Parse a locale decimal into a finite `f64`.
pub fn parse_decimal(text: &str) -> Result<f64, LocaleError> {
    let normalized = normalize_decimal_text(text);
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(LocaleError::InvalidDecimal(text.to_string())),
    }
}

/// Parse a `dd/mm/yyyy` date.
pub fn parse_day_first(text: &str) -> Result<NaiveDate, LocaleError> {
    NaiveDate::parse_from_str(text.trim(), DAY_FIRST_FORMAT)
        .map_err(|_| LocaleError::InvalidDate(text.to_string()))
}

/// Parse the date shapes found in the positions collection.
///
/// Accepts ISO dates, ISO/RFC 3339 timestamps (date part kept) and day-first text.
pub fn parse_flexible_date(text: &str) -> Result<NaiveDate, LocaleError> {
    let s = text.trim();

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    parse_day_first(s)
}

/// Days since the Unix epoch, the physical representation of a polars `Date`.
pub fn epoch_days(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_thousands_before_swapping_comma() {
        assert_eq!(normalize_decimal_text("1.234,56"), "1234.56");
        assert_eq!(normalize_decimal_text(" 12,5 "), "12.5");
        assert_eq!(normalize_decimal_text("1.000.000"), "1000000");
    }

    #[test]
    fn parses_locale_decimals() {
        assert_eq!(parse_decimal("1.234,56").unwrap(), 1234.56);
        assert_eq!(parse_decimal("6,12").unwrap(), 6.12);
        assert_eq!(parse_decimal("-0,35").unwrap(), -0.35);
        assert_eq!(parse_decimal("100").unwrap(), 100.0);
    }

    #[test]
    fn rejects_garbage_and_non_finite() {
        assert!(matches!(parse_decimal(""), Err(LocaleError::InvalidDecimal(_))));
        assert!(parse_decimal("abc").is_err());
        assert!(parse_decimal("inf").is_err());
        assert!(parse_decimal("NaN").is_err());
    }

    #[test]
    fn parses_day_first_dates() {
        let d = parse_day_first("03/10/2024").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 10, 3).unwrap());
        assert!(parse_day_first("2024-10-03").is_err());
        assert!(parse_day_first("31/02/2024").is_err());
    }

    #[test]
    fn flexible_dates_cover_collection_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(parse_flexible_date("2024-01-02").unwrap(), expected);
        assert_eq!(parse_flexible_date("2024-01-02T00:00:00Z").unwrap(), expected);
        assert_eq!(parse_flexible_date("2024-01-02T15:30:00.000").unwrap(), expected);
        assert_eq!(parse_flexible_date("2024-01-02 08:00:00").unwrap(), expected);
        assert_eq!(parse_flexible_date("02/01/2024").unwrap(), expected);
        assert!(parse_flexible_date("yesterday").is_err());
    }

    #[test]
    fn epoch_days_matches_polars_physical_dates() {
        assert_eq!(epoch_days(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()), 0);
        assert_eq!(epoch_days(NaiveDate::from_ymd_opt(1970, 1, 11).unwrap()), 10);
        assert_eq!(epoch_days(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()), -1);
    }
}
