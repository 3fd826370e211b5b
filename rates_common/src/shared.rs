//! Thread-safe handle to a `RateTable`.
//!
//! `SharedRateTable` is cheap to clone and can be handed to worker threads.
//! Readers take the read lock only long enough to clone the current
//! `Arc<RateSnapshot>` and then work on that snapshot without holding any lock.
//! `update` builds the replacement snapshot completely before publishing it
//! under the write lock, so a reader sees either the old table or the new one,
//! never a mix.
use std::sync::{Arc, RwLock};

use crate::quote::Quote;
use crate::result::Result;
use crate::table::{RateSnapshot, RateTable};

/// Cloneable, lock-protected `RateTable`.
#[derive(Debug, Clone, Default)]
pub struct SharedRateTable {
    inner: Arc<RwLock<RateTable>>,
}

impl SharedRateTable {
    /// Builds the table from `quotes` and wraps it for sharing.
    pub fn new<I>(quotes: I) -> Self
    where
        I: IntoIterator<Item = Quote>,
    {
        Self::from_table(RateTable::new(quotes))
    }

    /// Wraps an existing table.
    pub fn from_table(table: RateTable) -> Self {
        SharedRateTable {
            inner: Arc::new(RwLock::new(table)),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Result<Arc<RateSnapshot>> {
        let table = self.inner.read()?;
        Ok(table.snapshot())
    }

    /// Converts `amount` of `from` into `to` against the current snapshot.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64> {
        self.snapshot()?.convert(amount, from, to)
    }

    /// Sets the USD price of `symbol` and republishes the table.
    ///
    /// See [`RateTable::update`] for validation rules.
    pub fn update(&self, symbol: &str, usd_price: f64) -> Result<()> {
        let mut table = self.inner.write()?;
        table.update(symbol, usd_price)
    }
}
