//! Error types for the measurement harness.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations. Setup faults are returned to the caller; per-operation
//! faults inside a running workload are counted, not propagated (§ error
//! policy in the crate docs).

use std::io;
use thiserror::Error;

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the measurement harness.
#[derive(Debug, Error)]
pub enum Error {
    /// The storage engine reported a fault (open, read, write, or commit).
    #[error("engine error: {0}")]
    Engine(String),

    /// I/O error (temp directory allocation, thread spawn).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A run or visibility configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A staged batch was used after its commit.
    #[error("batch already committed")]
    BatchConsumed,

    /// A worker or prober thread panicked before reaching the join barrier.
    #[error("worker thread panicked")]
    WorkerPanic,
}

impl From<rocksdb::Error> for Error {
    fn from(e: rocksdb::Error) -> Self {
        Error::Engine(e.into_string())
    }
}
