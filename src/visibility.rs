//! Write-visibility probing.
//!
//! Measures the gap between a write being accepted and the key becoming
//! observable to an independent reader. A dedicated sequential writer issues
//! one paced write per key; immediately after each write returns, a
//! concurrent reader task starts polling that exact key. Strict
//! write-then-read pairing per key keeps the measurement free of cross-key
//! interference, which is why the bulk worker pool is not used here.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::codec;
use crate::config::VisibilityConfig;
use crate::engine::KvEngine;
use crate::error::{Error, Result};
use crate::metrics::{Counters, LatencySlots, Stats};

/// What a visibility run produced.
#[derive(Debug, Clone)]
pub struct VisibilityOutcome {
    pub elapsed: Duration,
    /// `write_ops` and `read_ops` (first successful probes); `errors` counts
    /// value mismatches observed by probers.
    pub stats: Stats,
    /// Probes that exhausted their attempt budget.
    pub misses: u64,
    /// Elapsed nanoseconds per write index; [`crate::metrics::MISS_SENTINEL`]
    /// marks a miss.
    pub latencies: Vec<i64>,
}

/// Execute one write-visibility run against `engine`.
///
/// Does not return until every reader task has either observed its key or
/// exhausted its attempt budget. A failed write is setup-grade: the writer
/// loop stops, already-spawned readers are drained, and the error is
/// returned.
pub fn run_visibility(
    engine: Arc<dyn KvEngine>,
    config: &VisibilityConfig,
) -> Result<VisibilityOutcome> {
    config.validate()?;

    let counters = Arc::new(Counters::new());
    let slots = Arc::new(LatencySlots::new(config.write_count));
    debug!(
        write_count = config.write_count,
        sync = config.durability.is_sync(),
        "starting visibility run"
    );

    let start = Instant::now();
    let mut readers: Vec<JoinHandle<()>> = Vec::with_capacity(config.write_count);
    let mut write_err = None;

    for idx in 0..config.write_count {
        let (key, value) = codec::probe_record(idx, &config.key_prefix, config.value_size);

        // The clock starts just before the write call, so the recorded
        // latency includes the write's own completion.
        let write_started = Instant::now();
        if let Err(err) = engine.put(&key, &value, config.durability) {
            write_err = Some(err);
            break;
        }
        counters.record_write();

        match spawn_reader(
            Arc::clone(&engine),
            config,
            idx,
            key,
            value,
            write_started,
            Arc::clone(&counters),
            Arc::clone(&slots),
        ) {
            Ok(handle) => readers.push(handle),
            Err(err) => {
                write_err = Some(err);
                break;
            }
        }

        if idx + 1 < config.write_count {
            thread::sleep(config.write_pacing);
        }
    }

    // Completion barrier: analysis must not start while any reader is
    // still polling.
    let mut panicked = false;
    for reader in readers {
        panicked |= reader.join().is_err();
    }
    let elapsed = start.elapsed();

    if let Some(err) = write_err {
        return Err(err);
    }
    if panicked {
        return Err(Error::WorkerPanic);
    }

    Ok(VisibilityOutcome {
        elapsed,
        stats: counters.snapshot(),
        misses: slots.miss_count(),
        latencies: slots.finish(),
    })
}

#[allow(clippy::too_many_arguments)]
fn spawn_reader(
    engine: Arc<dyn KvEngine>,
    config: &VisibilityConfig,
    idx: usize,
    key: Vec<u8>,
    expected: Vec<u8>,
    write_started: Instant,
    counters: Arc<Counters>,
    slots: Arc<LatencySlots>,
) -> Result<JoinHandle<()>> {
    let attempts = config.read_attempts;
    let interval = config.read_interval;
    let handle = thread::Builder::new()
        .name(format!("kvgauge-probe-{idx}"))
        .spawn(move || {
            for _ in 0..attempts {
                match engine.get(&key) {
                    Ok(Some(found)) => {
                        // The first successful get is the resolving poll,
                        // so the elapsed time is always nonzero.
                        slots.record_hit(idx, write_started.elapsed());
                        counters.record_read();
                        if found != expected {
                            counters.record_error();
                            warn!(idx, "probe observed a value that differs from the write");
                        }
                        return;
                    }
                    Ok(None) => {}
                    // An engine fault is not an eventual-consistency miss;
                    // keep polling within the budget.
                    Err(err) => warn!(idx, %err, "probe read failed"),
                }
                thread::sleep(interval);
            }
            slots.record_miss(idx);
        })?;
    Ok(handle)
}
