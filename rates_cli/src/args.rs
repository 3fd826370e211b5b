//! Command-line arguments for the rate converter.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use rates_common::RateConvention;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the JSON rates file (`{"rates": [{"symbol": .., "usd_rate": ..}]}`).
    #[clap(long, default_value = "./rates.json")]
    pub rates: String,

    /// How to read the numbers in the rates file.
    #[clap(long, value_enum, default_value_t = RateConvention::UsdPrice)]
    pub convention: RateConvention,

    /// File with one request per line (`SHOW EOS BTC`, `UPDATE BTC 50000`, ...).
    /// Requests are read from stdin when omitted.
    #[clap(long)]
    pub script: Option<String>,
}
