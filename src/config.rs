//! Run and visibility configuration.
//!
//! A [`RunConfig`] parameterizes one throughput run; a [`VisibilityConfig`]
//! parameterizes one write-visibility run. Both are immutable once handed to
//! the entry points and are validated up front, so workers never observe a
//! half-checked parameter set.

use std::time::Duration;

use serde::Serialize;

use crate::error::{Error, Result};

/// Per-write durability flag, passed through to the engine unchanged.
///
/// `Sync` blocks the write (or batch commit) until the change is flushed to
/// stable storage. `NoSync` returns once the change is queued; durability
/// then depends on a later implicit flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DurabilityMode {
    Sync,
    NoSync,
}

impl DurabilityMode {
    pub fn is_sync(self) -> bool {
        matches!(self, DurabilityMode::Sync)
    }
}

/// Parameters for one throughput run.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    /// Total operation index space; partitioned evenly across workers.
    pub op_count: usize,
    /// Number of parallel workers.
    pub workers: usize,
    /// Writes staged per atomic batch commit; 1 means no batching.
    pub batch_size: usize,
    /// Encoded key width in bytes.
    pub key_size: usize,
    /// Encoded value width in bytes.
    pub value_size: usize,
    /// Fraction of operations that are reads, in `[0, 1]`.
    pub read_ratio: f64,
    /// Durability mode for every write and batch commit in the run.
    pub durability: DurabilityMode,
    /// Open the engine on in-memory storage instead of disk.
    pub in_memory: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            op_count: 100_000,
            workers: default_workers(),
            batch_size: 1,
            key_size: 16,
            value_size: 100,
            read_ratio: 0.0,
            durability: DurabilityMode::NoSync,
            in_memory: false,
        }
    }
}

impl RunConfig {
    /// Check the run invariants: `op_count >= workers >= 1`, a sensible
    /// batch size, and `read_ratio` in `[0, 1]`.
    ///
    /// Key and value sizes are a caller contract: an index whose decimal
    /// form exceeds `key_size` encodes truncated (see [`crate::codec`]).
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidConfig("workers must be >= 1".into()));
        }
        if self.op_count < self.workers {
            return Err(Error::InvalidConfig(format!(
                "op_count ({}) must be >= workers ({})",
                self.op_count, self.workers
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.read_ratio) {
            return Err(Error::InvalidConfig(format!(
                "read_ratio ({}) must be in [0, 1]",
                self.read_ratio
            )));
        }
        Ok(())
    }

    /// Engine open options matching this run. Only the storage mode is
    /// derived here; tuning knobs keep their defaults.
    pub fn engine_config(&self) -> crate::engine::EngineConfig {
        crate::engine::EngineConfig {
            in_memory: self.in_memory,
            ..crate::engine::EngineConfig::default()
        }
    }
}

/// Parameters for one write-visibility run.
#[derive(Debug, Clone, Serialize)]
pub struct VisibilityConfig {
    /// Durability mode for the sequential writer.
    pub durability: DurabilityMode,
    /// Number of keys written and probed.
    pub write_count: usize,
    /// Poll attempts per key before recording a miss.
    pub read_attempts: usize,
    /// Sleep between poll attempts.
    pub read_interval: Duration,
    /// Pacing between consecutive writes (not applied after the last).
    pub write_pacing: Duration,
    /// Key prefix for probed keys; the write index is appended.
    pub key_prefix: String,
    /// Encoded value width in bytes.
    pub value_size: usize,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            durability: DurabilityMode::NoSync,
            write_count: 1000,
            read_attempts: 1000,
            read_interval: Duration::from_micros(10),
            write_pacing: Duration::from_millis(10),
            key_prefix: "probe-key-".to_string(),
            value_size: 100,
        }
    }
}

impl VisibilityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.write_count == 0 {
            return Err(Error::InvalidConfig("write_count must be >= 1".into()));
        }
        if self.read_attempts == 0 {
            return Err(Error::InvalidConfig("read_attempts must be >= 1".into()));
        }
        Ok(())
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}
