//! Error types shared by the rate table, the rate source and the dispatcher.
//!
//! The `RateError` enum unifies loader failures, channel communication,
//! lock poisoning and the domain faults of the converter, so every crate in the
//! workspace can propagate a single error type.
use std::io;
use std::sync::PoisonError;

use thiserror::Error;

/// Unified error type for the converter workspace.
#[derive(Error, Debug)]
pub enum RateError {
    /// I/O error while reading a rates file or a request script.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// Failure while decoding a rates file via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Request queue send failed (dispatcher worker gone).
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Report channel receive failed (dispatcher worker gone).
    #[error("Channel receive failed: {0}")]
    ChannelRecv(String),

    /// A background worker thread terminated abnormally.
    #[error("Worker failed: {0}")]
    Worker(String),

    /// A poisoned lock was encountered on the shared table.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),

    /// Neither a direct nor a USD-pivoted path exists between the two symbols.
    #[error("Rate for {from}-{to} not found and no fallback via USD")]
    RateNotFound {
        /// Source symbol of the failed conversion.
        from: String,
        /// Target symbol of the failed conversion.
        to: String,
    },

    /// Rejected price update: bad symbol or non-positive/non-finite price.
    #[error("Invalid update parameters: {0}")]
    InvalidUpdateRequest(String),

    /// A request line could not be parsed.
    #[error("Invalid request: {0}")]
    ParseCommand(String),
}

impl<T> From<PoisonError<T>> for RateError {
    fn from(err: PoisonError<T>) -> Self {
        RateError::MutexLock(err.to_string())
    }
}
