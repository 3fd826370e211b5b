//!
//! Currency conversion through a USD pivot.
//!
//! This crate aggregates:
//! - `error` — unified error type `RateError` used across the workspace.
//! - `result` — handy `Result<T, RateError>` alias.
//! - `quote` — `Quote` records and the JSON rate source.
//! - `table` — `RateTable`: USD map, derived cross-rates, updates and conversion.
//! - `shared` — thread-safe copy-on-write handle around a `RateTable`.
//! - `command` — text requests (`SHOW`, `UPDATE`, ...) fed to the dispatcher.
//! - `dispatcher` — maps requests to table operations and produces reports.
#![warn(missing_docs)]
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod quote;
pub mod result;
pub mod shared;
pub mod table;

pub use command::Request;
pub use dispatcher::{Dispatcher, DispatcherHandle, Report};
pub use error::RateError;
pub use quote::{Quote, RateConvention};
pub use result::Result;
pub use shared::SharedRateTable;
pub use table::{RateSnapshot, RateTable};
