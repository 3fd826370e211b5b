//! Requests accepted by the dispatcher.
//!
//! Requests arrive as text lines, one per request:
//!
//! ```text
//! SHOW EOS BTC
//! UPDATE BTC 50000
//! CONVERT 4000 ETH BTC
//! RATES
//! ```
//!
//! The leading keyword is case-insensitive. `SHOW_PRICE` and `UPDATE_USD_PRICE`
//! are accepted as aliases. Symbols are passed through with their case intact.
use std::str::FromStr;

use strum_macros::{Display, EnumString};

use crate::error::RateError;
use crate::result::Result;

/// Header keyword of a request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum RequestKind {
    /// `SHOW <from> <to>`
    #[strum(to_string = "SHOW", serialize = "SHOW_PRICE")]
    Show,
    /// `UPDATE <symbol> <usd_price>`
    #[strum(to_string = "UPDATE", serialize = "UPDATE_USD_PRICE")]
    Update,
    /// `CONVERT <amount> <from> <to>`
    Convert,
    /// `RATES`
    Rates,
}

impl RequestKind {
    fn arity(self) -> usize {
        match self {
            RequestKind::Show | RequestKind::Update => 2,
            RequestKind::Convert => 3,
            RequestKind::Rates => 0,
        }
    }
}

/// A single request for the rate table.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Show the value of one unit of `from` in `to`.
    ShowConversion {
        /// Source symbol.
        from: String,
        /// Target symbol.
        to: String,
    },
    /// Set the USD price of `symbol`.
    UpdatePrice {
        /// Symbol to update or insert.
        symbol: String,
        /// New USD price of one unit.
        usd_price: f64,
    },
    /// Convert an arbitrary amount.
    Convert {
        /// Amount of `from` to convert.
        amount: f64,
        /// Source symbol.
        from: String,
        /// Target symbol.
        to: String,
    },
    /// Dump every cross-rate currently in the table.
    ListRates,
}

impl Request {
    /// Creates a `ShowConversion` request.
    pub fn show(from: &str, to: &str) -> Self {
        Request::ShowConversion {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Creates an `UpdatePrice` request.
    pub fn update(symbol: &str, usd_price: f64) -> Self {
        Request::UpdatePrice {
            symbol: symbol.to_string(),
            usd_price,
        }
    }

    /// Creates a `Convert` request.
    pub fn convert(amount: f64, from: &str, to: &str) -> Self {
        Request::Convert {
            amount,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Kind of this request.
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::ShowConversion { .. } => RequestKind::Show,
            Request::UpdatePrice { .. } => RequestKind::Update,
            Request::Convert { .. } => RequestKind::Convert,
            Request::ListRates => RequestKind::Rates,
        }
    }

    /// Parses a script line.
    ///
    /// Returns `Ok(None)` for blank lines and `#` comments.
    pub fn parse_line(line: &str) -> Result<Option<Self>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

fn parse_number(field: &str, what: &str) -> Result<f64> {
    field
        .parse::<f64>()
        .map_err(|e| RateError::ParseCommand(format!("{what} {field:?} is not a number: {e}")))
}

impl FromStr for Request {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self> {
        let mut fields = s.split_whitespace();
        let header = fields
            .next()
            .ok_or_else(|| RateError::ParseCommand("empty request".to_string()))?;
        let kind: RequestKind = header
            .parse()
            .map_err(|_| RateError::ParseCommand(format!("unknown request {header:?}")))?;

        let args: Vec<&str> = fields.collect();
        if args.len() != kind.arity() {
            return Err(RateError::ParseCommand(format!(
                "{kind} expects {} argument(s), got {}",
                kind.arity(),
                args.len()
            )));
        }

        let request = match kind {
            RequestKind::Show => Request::show(args[0], args[1]),
            RequestKind::Update => Request::update(args[0], parse_number(args[1], "price")?),
            RequestKind::Convert => {
                Request::convert(parse_number(args[0], "amount")?, args[1], args[2])
            }
            RequestKind::Rates => Request::ListRates,
        };
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_kind() {
        assert_eq!(
            "SHOW EOS BTC".parse::<Request>().unwrap(),
            Request::show("EOS", "BTC")
        );
        assert_eq!(
            "update BTC 50000".parse::<Request>().unwrap(),
            Request::update("BTC", 50000.0)
        );
        assert_eq!(
            "Convert 4000 ETH BTC".parse::<Request>().unwrap(),
            Request::convert(4000.0, "ETH", "BTC")
        );
        assert_eq!("rates".parse::<Request>().unwrap(), Request::ListRates);
    }

    #[test]
    fn accepts_event_names_as_aliases() {
        assert_eq!(
            "SHOW_PRICE LTC BTC".parse::<Request>().unwrap().kind(),
            RequestKind::Show
        );
        assert_eq!(
            "UPDATE_USD_PRICE BTC 1".parse::<Request>().unwrap().kind(),
            RequestKind::Update
        );
    }

    #[test]
    fn symbols_keep_their_case() {
        assert_eq!(
            "SHOW btc Eth".parse::<Request>().unwrap(),
            Request::show("btc", "Eth")
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in [
            "FETCH BTC",
            "SHOW BTC",
            "UPDATE BTC",
            "UPDATE BTC abc",
            "CONVERT x A B",
            "RATES now",
        ] {
            assert!(
                matches!(line.parse::<Request>(), Err(RateError::ParseCommand(_))),
                "{line} should be rejected"
            );
        }
    }

    #[test]
    fn non_positive_prices_still_parse() {
        // range checks belong to the table
        assert_eq!(
            "UPDATE BTC -5".parse::<Request>().unwrap(),
            Request::update("BTC", -5.0)
        );
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert_eq!(Request::parse_line("   ").unwrap(), None);
        assert_eq!(Request::parse_line("# initial conversions").unwrap(), None);
        assert!(Request::parse_line("SHOW A B").unwrap().is_some());
    }
}
