//! Quote records and the JSON rate source.
//!
//! A `Quote` pairs a symbol with its USD rate. Quotes are read from a JSON
//! document shaped like
//!
//! ```json
//! { "rates": [ { "symbol": "BTC", "usd_rate": 30000.0 } ] }
//! ```
//!
//! Rows may also use the exchange-feed field names `asset_id_quote` and `rate`.
//! The meaning of the number is chosen with `RateConvention`: either the USD
//! price of one unit, or the number of units one USD buys. Either way, quotes
//! leave this module normalized to USD prices.
//!
//! Validation is not done here. Rows with a missing or non-numeric rate become
//! NaN quotes and are dropped by the table builder together with every other
//! non-positive or non-finite rate.
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use clap::ValueEnum;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::RateError;
use crate::result::Result;

/// A single `(symbol, USD rate)` input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Case-sensitive asset identifier, e.g. `BTC`.
    pub symbol: String,
    /// USD price of one unit of `symbol`.
    pub usd_rate: f64,
}

impl Quote {
    /// Creates a new quote.
    pub fn new(symbol: impl Into<String>, usd_rate: f64) -> Self {
        Quote {
            symbol: symbol.into(),
            usd_rate,
        }
    }
}

/// How the numbers in a rates file are to be read.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum RateConvention {
    /// The rate is the USD price of one unit (`BTC = 30000`).
    #[default]
    UsdPrice,
    /// The rate is how many units one USD buys (`BTC = 0.0000333`).
    UnitsPerUsd,
}

impl RateConvention {
    /// Normalizes a raw file rate to a USD price.
    ///
    /// Zero under `UnitsPerUsd` turns into infinity, which the table rejects.
    pub fn to_usd_price(self, rate: f64) -> f64 {
        match self {
            RateConvention::UsdPrice => rate,
            RateConvention::UnitsPerUsd => 1.0 / rate,
        }
    }
}

/// Trait providing parsing of quote documents.
pub trait QuoteSource: Sized {
    /// Parses quotes from a reader holding a JSON rates document.
    ///
    /// Returns an error only if the document as a whole is not valid JSON of the
    /// expected shape. Individual rows with a bad rate are kept as NaN quotes.
    fn parse_from_reader<R: Read>(reader: R, convention: RateConvention) -> Result<Vec<Self>>;
}

#[derive(Debug, Deserialize)]
struct RatesDocument {
    #[serde(default)]
    rates: Vec<RawQuote>,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(alias = "asset_id_quote")]
    symbol: Option<String>,
    #[serde(alias = "rate", default)]
    usd_rate: serde_json::Value,
}

impl QuoteSource for Quote {
    fn parse_from_reader<R: Read>(reader: R, convention: RateConvention) -> Result<Vec<Self>> {
        let document: RatesDocument = serde_json::from_reader(reader)?;
        let mut quotes = Vec::with_capacity(document.rates.len());

        for row in document.rates {
            let Some(symbol) = row.symbol else {
                debug!("Skipping rate row without a symbol: {:?}", row.usd_rate);
                continue;
            };
            let raw = row.usd_rate.as_f64().unwrap_or(f64::NAN);
            quotes.push(Quote::new(symbol, convention.to_usd_price(raw)));
        }
        Ok(quotes)
    }
}

/// Reads quotes from `path`.
///
/// A missing or malformed file is logged and yields an empty list, so the caller
/// always gets something it can build a (possibly empty) table from.
pub fn load_quotes(path: &Path, convention: RateConvention) -> Vec<Quote> {
    let result = File::open(path)
        .map_err(RateError::Io)
        .and_then(|file| Quote::parse_from_reader(BufReader::new(file), convention));

    match result {
        Ok(quotes) => {
            info!(
                "Read {} quotes from {} ({})",
                quotes.len(),
                path.display(),
                convention
            );
            quotes
        }
        Err(e) => {
            error!("Error reading file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_both_field_spellings() {
        let json = br#"{ "rates": [
            { "symbol": "BTC", "usd_rate": 30000 },
            { "asset_id_quote": "ETH", "rate": 2000.5 }
        ] }"#;
        let quotes = Quote::parse_from_reader(&json[..], RateConvention::UsdPrice).unwrap();
        assert_eq!(
            quotes,
            vec![Quote::new("BTC", 30000.0), Quote::new("ETH", 2000.5)]
        );
    }

    #[test]
    fn units_per_usd_rows_are_inverted() {
        let json = br#"{ "asset_id_base": "USD", "rates": [
            { "time": "2024-01-01T00:00:00Z", "asset_id_quote": "EOS", "rate": 0.5 }
        ] }"#;
        let quotes = Quote::parse_from_reader(&json[..], RateConvention::UnitsPerUsd).unwrap();
        assert_eq!(quotes, vec![Quote::new("EOS", 2.0)]);
    }

    #[test]
    fn non_numeric_rate_becomes_nan_and_missing_symbol_is_dropped() {
        let json = br#"{ "rates": [
            { "symbol": "BAD", "usd_rate": "abc" },
            { "symbol": "NUL" },
            { "usd_rate": 5 }
        ] }"#;
        let quotes = Quote::parse_from_reader(&json[..], RateConvention::UsdPrice).unwrap();
        assert_eq!(quotes.len(), 2);
        assert!(quotes.iter().all(|q| q.usd_rate.is_nan()));
    }

    #[test]
    fn malformed_document_is_an_error() {
        let result = Quote::parse_from_reader(&b"{ not json"[..], RateConvention::UsdPrice);
        assert!(matches!(result, Err(RateError::SerdeJson(_))));
    }

    #[test]
    fn load_quotes_tolerates_missing_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_quotes(&dir.path().join("absent.json"), RateConvention::UsdPrice).is_empty());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "[1, 2").unwrap();
        assert!(load_quotes(&broken, RateConvention::UsdPrice).is_empty());
    }

    #[test]
    fn load_quotes_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "rates": [ {{ "symbol": "EOS", "usd_rate": 3 }} ] }}"#).unwrap();
        let quotes = load_quotes(file.path(), RateConvention::UsdPrice);
        assert_eq!(quotes, vec![Quote::new("EOS", 3.0)]);
    }

    #[test]
    fn convention_parses_from_text() {
        assert_eq!(
            "units-per-usd".parse::<RateConvention>().unwrap(),
            RateConvention::UnitsPerUsd
        );
        assert_eq!(RateConvention::UsdPrice.to_string(), "usd-price");
    }
}
