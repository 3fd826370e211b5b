//! End-to-end checks: rates file -> table -> dispatcher.
use std::io::Write;

use approx::assert_relative_eq;
use rates_common::quote::load_quotes;
use rates_common::{
    Dispatcher, Quote, RateConvention, RateError, RateTable, Report, Request, SharedRateTable,
};

const FEED: &str = r#"{
    "asset_id_base": "USD",
    "rates": [
        { "asset_id_quote": "BTC", "rate": 0.00003333333333333333 },
        { "asset_id_quote": "ETH", "rate": 0.0005 },
        { "asset_id_quote": "EOS", "rate": 0.3333333333333333 },
        { "asset_id_quote": "DEAD", "rate": 0 },
        { "asset_id_quote": "JUNK", "rate": "n/a" }
    ]
}"#;

fn feed_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FEED.as_bytes()).unwrap();
    file
}

#[test]
fn exchange_feed_builds_price_table() {
    let file = feed_file();
    let quotes = load_quotes(file.path(), RateConvention::UnitsPerUsd);
    assert_eq!(quotes.len(), 5);

    let table = RateTable::new(quotes);
    assert_eq!(table.snapshot().symbols(), vec!["BTC", "EOS", "ETH"]);
    assert_relative_eq!(table.usd_rate("BTC").unwrap(), 30000.0, max_relative = 1e-12);
    assert_relative_eq!(
        table.convert(1.0, "ETH", "BTC").unwrap(),
        2000.0 / 30000.0,
        max_relative = 1e-12
    );
}

#[test]
fn missing_file_gives_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    let table = RateTable::new(load_quotes(
        &dir.path().join("rates.json"),
        RateConvention::UsdPrice,
    ));
    assert!(table.is_empty());
    assert!(matches!(
        table.convert(1.0, "BTC", "USD"),
        Err(RateError::RateNotFound { .. })
    ));
}

#[test]
fn round_trip_over_every_pair() {
    let table = RateTable::new(vec![
        Quote::new("BTC", 30000.0),
        Quote::new("ETH", 2000.0),
        Quote::new("EOS", 3.0),
        Quote::new("LTC", 71.25),
    ]);
    let mut symbols: Vec<String> = table
        .snapshot()
        .symbols()
        .into_iter()
        .map(String::from)
        .collect();
    symbols.push("USD".to_string());

    for a in &symbols {
        for b in &symbols {
            let x = 123.456;
            let there = table.convert(x, a, b).unwrap();
            let back = table.convert(there, b, a).unwrap();
            assert_relative_eq!(back, x, max_relative = 1e-12);
        }
    }
}

#[test]
fn session_like_the_demo() {
    let shared = SharedRateTable::new(vec![
        Quote::new("BTC", 30000.0),
        Quote::new("ETH", 2000.0),
        Quote::new("EOS", 3.0),
    ]);
    let handle = Dispatcher::new(shared.clone()).spawn();

    let script = "\
        # before update\n\
        SHOW EOS BTC\n\
        SHOW LTC BTC\n\
        UPDATE LTC 90\n\
        UPDATE BTC -1\n\
        SHOW LTC BTC\n";

    let mut reports = Vec::new();
    for line in script.lines() {
        match Request::parse_line(line) {
            Ok(Some(request)) => reports.push(handle.request(request).unwrap()),
            Ok(None) => {}
            Err(e) => reports.push(Report::rejected(&e)),
        }
    }
    handle.shutdown().unwrap();

    let failures: Vec<bool> = reports.iter().map(Report::is_failure).collect();
    assert_eq!(failures, vec![false, true, false, true, false]);
    assert_eq!(reports[4].to_string(), "1 LTC is worth 0.00300000 BTC");
    assert_eq!(shared.snapshot().unwrap().usd_rate("BTC"), Some(30000.0));
}
