//! The storage engine as the harness consumes it.
//!
//! The harness does not implement a storage engine. It measures one through
//! the narrow capability set below: point reads and writes with a per-call
//! durability flag, atomic write batches, and a seekable ordered iterator.
//! The bundled adapter in [`rocks`] wraps an LSM-tree engine; anything that
//! can implement [`KvEngine`] can be measured, including fault-injecting
//! wrappers in tests.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::DurabilityMode;
use crate::error::Result;

mod rocks;

pub use rocks::RocksEngine;

/// Open-time engine options.
#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
    /// Storage directory. `None` allocates a scoped temp directory that is
    /// released when the handle drops, including on setup failure.
    pub path: Option<PathBuf>,
    /// Back the engine with in-memory storage instead of the filesystem.
    pub in_memory: bool,
    /// Block cache capacity in bytes.
    pub cache_bytes: usize,
    /// Write buffer (memtable) capacity in bytes.
    pub write_buffer_bytes: usize,
    /// Separate write-ahead-log directory; defaults to the storage dir.
    pub wal_dir: Option<PathBuf>,
    /// Parallelism for background flushes and compactions.
    pub max_background_jobs: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: None,
            in_memory: false,
            cache_bytes: 64 * 1024 * 1024,
            write_buffer_bytes: 64 * 1024 * 1024,
            wal_dir: None,
            max_background_jobs: std::thread::available_parallelism()
                .map(|p| p.get() as i32)
                .unwrap_or(2),
        }
    }
}

impl EngineConfig {
    /// In-memory variant of the defaults.
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            ..Self::default()
        }
    }
}

/// A storage engine handle shared by all worker and prober tasks of a run.
///
/// Implementations provide their own internal concurrency control; the
/// harness adds none beyond atomic counters. Closing the handle maps to
/// `Drop`.
pub trait KvEngine: Send + Sync + 'static {
    /// Point lookup. Absence is `Ok(None)`, never an error.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Single-record write at the given durability mode.
    fn put(&self, key: &[u8], value: &[u8], durability: DurabilityMode) -> Result<()>;

    /// Single-record delete at the given durability mode.
    fn delete(&self, key: &[u8], durability: DurabilityMode) -> Result<()>;

    /// Start staging an atomic batch of writes.
    fn batch(&self) -> Box<dyn StagedBatch + '_>;

    /// Ordered iterator over the full key space.
    fn iter(&self) -> Result<Box<dyn KvIter + '_>>;

    /// All records whose key starts with `prefix`, in key order.
    ///
    /// Seeks to the prefix and advances while the key retains it; an empty
    /// prefix scans everything.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut iter = self.iter()?;
        if prefix.is_empty() {
            iter.seek_to_first();
        } else {
            iter.seek(prefix);
        }
        let mut records = Vec::new();
        while iter.valid() {
            let key = match iter.key() {
                Some(key) if prefix.is_empty() || key.starts_with(prefix) => key.to_vec(),
                _ => break,
            };
            let value = iter.value().map(|value| value.to_vec()).unwrap_or_default();
            records.push((key, value));
            iter.next();
        }
        iter.status()?;
        Ok(records)
    }
}

/// A set of writes staged together and committed atomically with one
/// durability decision. Either every staged record lands or none does.
pub trait StagedBatch {
    /// Stage one write. A failure here means the chunk must be abandoned.
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Commit everything staged so far. Consumes the staged state; a second
    /// commit reports [`crate::Error::BatchConsumed`].
    fn commit(&mut self, durability: DurabilityMode) -> Result<()>;
}

/// Ordered engine iterator, used for prefix scans.
pub trait KvIter {
    /// Position at the first key `>=` the given key.
    fn seek(&mut self, key: &[u8]);

    /// Position at the first key in the store.
    fn seek_to_first(&mut self);

    /// Whether the iterator currently points at a record.
    fn valid(&self) -> bool;

    /// Advance to the next key.
    fn next(&mut self);

    /// Current key, when valid.
    fn key(&self) -> Option<&[u8]>;

    /// Current value, when valid.
    fn value(&self) -> Option<&[u8]>;

    /// Any deferred iteration error.
    fn status(&self) -> Result<()>;
}
