//! Rate converter CLI: loads USD quotes from a JSON file, builds the cross-rate
//! table and answers requests read line by line from a script file or stdin.
//!
//! Usage example (CLI):
//! ```bash
//! rates_cli --rates ./demos/rates.json --script ./demos/session.txt
//! echo "SHOW ETH BTC" | rates_cli --rates ./rates.json
//! ```
//!
//! Every request produces one line (or block, for `RATES`) on stdout. Failed
//! conversions and rejected requests are printed the same way and never stop
//! the session. See `rates_common::command` for the request syntax.
#![warn(missing_docs)]
mod args;

use crate::args::Args;
use clap::Parser;
use log::{info, warn};
use rates_common::quote::load_quotes;
use rates_common::{
    Dispatcher, DispatcherHandle, RateError, Report, Request, Result, SharedRateTable,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

/// Feeds every request line from `reader` to the dispatcher and prints the reports
/// in order. Returns the number of failed requests.
fn run_session<R: BufRead>(reader: R, dispatcher: &DispatcherHandle) -> Result<usize, RateError> {
    let mut failures = 0;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let report = match Request::parse_line(&line) {
            Ok(Some(request)) => dispatcher.request(request)?,
            Ok(None) => continue,
            Err(e) => {
                warn!("Line {}: {}", line_no + 1, e);
                Report::rejected(&e)
            }
        };
        if report.is_failure() {
            failures += 1;
        }
        println!("{}", report);
    }
    Ok(failures)
}

fn main() -> Result<(), RateError> {
    init_logger();
    let args = Args::parse();

    let rates_path = normalize_path(&args.rates);
    let quotes = load_quotes(&rates_path, args.convention);
    let table = SharedRateTable::new(quotes);
    info!("Known symbols: {:?}", table.snapshot()?.symbols());

    let dispatcher = Dispatcher::new(table).spawn();

    let failures = match &args.script {
        Some(script) => {
            let file = File::open(normalize_path(script))?;
            run_session(BufReader::new(file), &dispatcher)?
        }
        None => run_session(io::stdin().lock(), &dispatcher)?,
    };

    dispatcher.shutdown()?;
    info!("Session finished, {} request(s) failed", failures);
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
///
/// This allows passing Windows paths in quotes without breaking parsing.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rates_common::Quote;

    #[test]
    fn normalize_path_strips_quotes() {
        assert_eq!(
            normalize_path(" \"a b/rates.json\" "),
            PathBuf::from("a b/rates.json")
        );
        assert_eq!(normalize_path("rates.json"), PathBuf::from("rates.json"));
    }

    #[test]
    fn session_counts_failures() {
        let table =
            SharedRateTable::new(vec![Quote::new("BTC", 30000.0), Quote::new("EOS", 3.0)]);
        let dispatcher = Dispatcher::new(table).spawn();
        let script = "SHOW EOS BTC\n\nBOGUS\nUPDATE BTC 0\nSHOW EOS ZZZ\n";
        let failures = run_session(script.as_bytes(), &dispatcher).unwrap();
        assert_eq!(failures, 3);
        dispatcher.shutdown().unwrap();
    }
}
