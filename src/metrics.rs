//! Shared run metrics.
//!
//! One [`Counters`] instance is owned by a single run and shared by
//! reference with every worker and prober task. All mutation is atomic
//! increments; the latency slot array gives each probe index exclusive
//! ownership of its slot, so slot writes need no synchronization beyond the
//! atomic store itself.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Slot value recorded when a probe exhausts its attempt budget.
pub const MISS_SENTINEL: i64 = -1;

/// Atomic operation counters for one run.
#[derive(Debug, Default)]
pub struct Counters {
    write_ops: AtomicU64,
    read_ops: AtomicU64,
    errors: AtomicU64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_write(&self) {
        self.write_ops.fetch_add(1, Ordering::Relaxed);
    }

    /// Bulk credit for a committed batch.
    pub fn add_writes(&self, n: u64) {
        self.write_ops.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_read(&self) {
        self.read_ops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values. Called after the join barrier, when
    /// no task is still incrementing.
    pub fn snapshot(&self) -> Stats {
        Stats {
            write_ops: self.write_ops.load(Ordering::Relaxed),
            read_ops: self.read_ops.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Final counter values of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub write_ops: u64,
    pub read_ops: u64,
    pub errors: u64,
}

impl Stats {
    pub fn total_ops(&self) -> u64 {
        self.write_ops + self.read_ops
    }
}

/// Per-write visibility latency slots.
///
/// Pre-sized to the probe write count. Each slot is written exactly once, by
/// the one prober that owns its index: either the elapsed nanoseconds of the
/// first successful read, or [`MISS_SENTINEL`].
#[derive(Debug)]
pub struct LatencySlots {
    slots: Vec<AtomicI64>,
    misses: AtomicU64,
}

impl LatencySlots {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| AtomicI64::new(MISS_SENTINEL)).collect(),
            misses: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Record the first successful read for `idx`.
    pub fn record_hit(&self, idx: usize, elapsed: Duration) {
        let nanos = elapsed.as_nanos().min(i64::MAX as u128) as i64;
        self.slots[idx].store(nanos, Ordering::Relaxed);
    }

    /// Record that `idx` was never observed within the attempt budget.
    pub fn record_miss(&self, idx: usize) {
        self.slots[idx].store(MISS_SENTINEL, Ordering::Relaxed);
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Copy the slot values out. Called after every prober has joined.
    pub fn finish(&self) -> Vec<i64> {
        self.slots
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed))
            .collect()
    }
}
