//! USD-pivot rate table.
//!
//! A `RateSnapshot` holds a USD map (`symbol -> USD price`) and the cross-rate
//! table derived from it. Cross-rates are keyed `"FROM-TO"` and multiply an
//! amount of `FROM` into an amount of `TO`:
//!
//! - `SYM-USD = usd[SYM]`
//! - `USD-SYM = 1 / usd[SYM]`
//! - `A-B = usd[A] / usd[B]` for every ordered pair of distinct symbols
//!
//! Identity pairs are never stored.
//!
//! `RateTable` owns the current snapshot behind an `Arc`. An update never
//! mutates a published snapshot: it builds a complete replacement from the
//! modified USD map and swaps the handle, so anyone holding the previous
//! `Arc<RateSnapshot>` keeps a consistent view.
use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::RateError;
use crate::quote::Quote;
use crate::result::Result;

/// The pivot currency.
pub const USD: &str = "USD";
/// Separator between the two symbols of a pair key.
pub const PAIR_SEPARATOR: char = '-';

/// Builds the cross-rate key for `from -> to`.
pub fn pair_key(from: &str, to: &str) -> String {
    format!("{from}{PAIR_SEPARATOR}{to}")
}

/// Returns `true` if `symbol` can be quoted against USD.
///
/// Symbols are non-empty, contain no whitespace and no pair separator, and are
/// not the pivot itself.
pub fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol != USD
        && !symbol
            .chars()
            .any(|c| c == PAIR_SEPARATOR || c.is_whitespace())
}

/// Returns `true` if `rate` is admissible as a USD price.
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// An immutable USD map together with the cross-rates derived from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSnapshot {
    usd_map: HashMap<String, f64>,
    rates: HashMap<String, f64>,
}

impl RateSnapshot {
    /// Derives a snapshot from `quotes`.
    ///
    /// Quotes with an invalid symbol or a non-positive/non-finite rate are
    /// dropped. When a symbol repeats, the last admitted quote wins. Never fails:
    /// empty or all-invalid input produces an empty snapshot.
    pub fn build<I>(quotes: I) -> Self
    where
        I: IntoIterator<Item = Quote>,
    {
        let mut usd_map = HashMap::new();
        for quote in quotes {
            if is_valid_symbol(&quote.symbol) && is_valid_rate(quote.usd_rate) {
                usd_map.insert(quote.symbol, quote.usd_rate);
            } else {
                debug!("Excluding quote {} = {}", quote.symbol, quote.usd_rate);
            }
        }
        Self::from_usd_map(usd_map)
    }

    /// Derives the cross-rate table for an already validated USD map.
    ///
    /// A pair is stored in both directions or not at all: if either direction
    /// overflows or underflows, both are dropped and conversions between the
    /// two fail with `RateNotFound`.
    fn from_usd_map(usd_map: HashMap<String, f64>) -> Self {
        let n = usd_map.len();
        let mut rates = HashMap::with_capacity(n * (n + 1));

        let mut insert_pair = |a: &str, b: &str, ab: f64, ba: f64| {
            if is_valid_rate(ab) && is_valid_rate(ba) {
                rates.insert(pair_key(a, b), ab);
                rates.insert(pair_key(b, a), ba);
            } else {
                warn!(
                    "Dropping pair {}: derived rate {} out of range",
                    pair_key(a, b),
                    ab
                );
            }
        };

        for (sym, &price) in &usd_map {
            insert_pair(sym.as_str(), USD, price, 1.0 / price);
        }
        for (from, &from_price) in &usd_map {
            for (to, &to_price) in &usd_map {
                if from < to {
                    insert_pair(
                        from.as_str(),
                        to.as_str(),
                        from_price / to_price,
                        to_price / from_price,
                    );
                }
            }
        }

        RateSnapshot { usd_map, rates }
    }

    /// USD price of `symbol`, if known.
    pub fn usd_rate(&self, symbol: &str) -> Option<f64> {
        self.usd_map.get(symbol).copied()
    }

    /// Stored cross-rate for `from -> to`, if materialized.
    pub fn rate(&self, from: &str, to: &str) -> Option<f64> {
        self.rates.get(&pair_key(from, to)).copied()
    }

    /// The USD map.
    pub fn usd_map(&self) -> &HashMap<String, f64> {
        &self.usd_map
    }

    /// The full cross-rate table.
    pub fn rates(&self) -> &HashMap<String, f64> {
        &self.rates
    }

    /// Known symbols, sorted.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.usd_map.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    /// Number of known symbols (USD excluded).
    pub fn len(&self) -> usize {
        self.usd_map.len()
    }

    /// `true` if no symbol is known.
    pub fn is_empty(&self) -> bool {
        self.usd_map.is_empty()
    }

    fn knows(&self, symbol: &str) -> bool {
        symbol == USD || self.usd_map.contains_key(symbol)
    }

    /// Converts `amount` of `from` into `to`.
    ///
    /// Tries the direct pair first, then a double hop through USD. Identity pairs
    /// are not stored, so `SYM -> SYM` resolves through the hop and only
    /// `USD -> USD` reaches the identity fallback.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64> {
        if let Some(direct) = self.rate(from, to) {
            return Ok(amount * direct);
        }
        if let (Some(into_usd), Some(out_of_usd)) = (self.rate(from, USD), self.rate(USD, to)) {
            let factor = into_usd * out_of_usd;
            if is_valid_rate(factor) {
                return Ok(amount * factor);
            }
        }
        if from == to && self.knows(from) {
            return Ok(amount);
        }
        Err(RateError::RateNotFound {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// Returns a new snapshot with `symbol` set to `usd_price`.
    fn with_price(&self, symbol: &str, usd_price: f64) -> Self {
        let mut usd_map = self.usd_map.clone();
        usd_map.insert(symbol.to_string(), usd_price);
        Self::from_usd_map(usd_map)
    }
}

/// Converter owning the current `RateSnapshot`.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    snapshot: Arc<RateSnapshot>,
}

impl RateTable {
    /// Builds a table from an initial list of quotes.
    pub fn new<I>(quotes: I) -> Self
    where
        I: IntoIterator<Item = Quote>,
    {
        let snapshot = RateSnapshot::build(quotes);
        info!(
            "Rate table built: {} symbols, {} cross-rates",
            snapshot.len(),
            snapshot.rates.len()
        );
        RateTable {
            snapshot: Arc::new(snapshot),
        }
    }

    /// Sets the USD price of `symbol` (inserting it if new) and rebuilds every
    /// cross-rate.
    ///
    /// Invalid parameters leave the table untouched and are returned as
    /// `RateError::InvalidUpdateRequest`.
    pub fn update(&mut self, symbol: &str, usd_price: f64) -> Result<()> {
        if let Err(e) = validate_update(symbol, usd_price) {
            warn!("{}", e);
            return Err(e);
        }

        info!("Updating {} price to {} USD", symbol, usd_price);
        let next = self.snapshot.with_price(symbol, usd_price);
        self.snapshot = Arc::new(next);
        Ok(())
    }

    /// Converts `amount` of `from` into `to` using the current snapshot.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64> {
        self.snapshot.convert(amount, from, to)
    }

    /// Handle to the current snapshot.
    pub fn snapshot(&self) -> Arc<RateSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// USD price of `symbol`, if known.
    pub fn usd_rate(&self, symbol: &str) -> Option<f64> {
        self.snapshot.usd_rate(symbol)
    }

    /// Stored cross-rate for `from -> to`, if materialized.
    pub fn rate(&self, from: &str, to: &str) -> Option<f64> {
        self.snapshot.rate(from, to)
    }

    /// Number of known symbols.
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    /// `true` if no symbol is known.
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}

fn validate_update(symbol: &str, usd_price: f64) -> Result<()> {
    if !is_valid_symbol(symbol) {
        return Err(RateError::InvalidUpdateRequest(format!(
            "bad symbol {symbol:?}"
        )));
    }
    if !is_valid_rate(usd_price) {
        return Err(RateError::InvalidUpdateRequest(format!(
            "price for {symbol} must be a positive finite number, got {usd_price}"
        )));
    }
    Ok(())
}
