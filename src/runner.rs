//! Concurrent worker pool for throughput runs.
//!
//! The operation index space `[0, op_count)` is split into contiguous
//! per-worker partitions of `op_count / workers` indices; a remainder never
//! executes (preserved boundary behavior). Workers all start before any is
//! awaited and are joined as a single barrier. Per-operation engine faults
//! are swallowed into the error counter so that one broken key never halts
//! throughput measurement of the rest.

use std::ops::Range;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::codec;
use crate::config::RunConfig;
use crate::engine::KvEngine;
use crate::error::{Error, Result};
use crate::metrics::{Counters, Stats};

/// What a throughput run produced: wall-clock elapsed time plus the final
/// counter values.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub elapsed: Duration,
    pub stats: Stats,
}

/// The four workload loop shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopShape {
    WriteOnly,
    ReadOnly,
    Mixed,
    Batched,
}

/// Batching applies only to runs with no read component; a mixed run always
/// issues individual operations.
fn shape_for(config: &RunConfig) -> LoopShape {
    if config.read_ratio >= 1.0 {
        LoopShape::ReadOnly
    } else if config.read_ratio <= 0.0 {
        if config.batch_size > 1 {
            LoopShape::Batched
        } else {
            LoopShape::WriteOnly
        }
    } else {
        LoopShape::Mixed
    }
}

/// Execute one throughput run against `engine`.
///
/// Returns once every worker has joined. Setup faults (validation, thread
/// spawn) are returned as errors; per-operation faults only show up in
/// `stats.errors`.
pub fn run(engine: Arc<dyn KvEngine>, config: &RunConfig) -> Result<RunOutcome> {
    config.validate()?;

    let counters = Arc::new(Counters::new());
    let per_worker = config.op_count / config.workers;
    let shape = shape_for(config);
    debug!(
        op_count = config.op_count,
        workers = config.workers,
        ?shape,
        "starting throughput run"
    );

    let start = Instant::now();
    let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(config.workers);
    for worker in 0..config.workers {
        let engine = Arc::clone(&engine);
        let counters = Arc::clone(&counters);
        let config = config.clone();
        let range = worker * per_worker..(worker + 1) * per_worker;
        let spawned = thread::Builder::new()
            .name(format!("kvgauge-worker-{worker}"))
            .spawn(move || match shape {
                LoopShape::WriteOnly => write_loop(&*engine, &config, &counters, range),
                LoopShape::ReadOnly => read_loop(&*engine, &config, &counters, range),
                LoopShape::Mixed => mixed_loop(&*engine, &config, &counters, range, worker),
                LoopShape::Batched => batched_loop(&*engine, &config, &counters, range),
            });
        match spawned {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                // Drain the workers that did start before surfacing the
                // setup fault.
                for handle in handles {
                    let _ = handle.join();
                }
                return Err(err.into());
            }
        }
    }

    let mut panicked = false;
    for handle in handles {
        panicked |= handle.join().is_err();
    }
    let elapsed = start.elapsed();
    if panicked {
        return Err(Error::WorkerPanic);
    }

    Ok(RunOutcome {
        elapsed,
        stats: counters.snapshot(),
    })
}

/// Sequentially write records for indices `[0, count)` at the configured
/// durability, for read and mixed runs that need existing data. Unlike the
/// workload loops, a failure here is setup-grade and aborts.
pub fn preload(engine: &dyn KvEngine, config: &RunConfig, count: usize) -> Result<()> {
    for idx in 0..count {
        let (key, value) = codec::encode_record(idx, config.key_size, config.value_size);
        engine.put(&key, &value, config.durability)?;
    }
    debug!(count, "preload complete");
    Ok(())
}

fn write_loop(engine: &dyn KvEngine, config: &RunConfig, counters: &Counters, range: Range<usize>) {
    for idx in range {
        write_one(engine, config, counters, idx);
    }
}

fn read_loop(engine: &dyn KvEngine, config: &RunConfig, counters: &Counters, range: Range<usize>) {
    for idx in range {
        read_one(engine, config, counters, idx);
    }
}

/// Per index, draw a decision value; below `read_ratio` the operation is a
/// read, remapped uniformly over this worker's already-visited prefix so
/// reads target indices a write could have reached.
fn mixed_loop(
    engine: &dyn KvEngine,
    config: &RunConfig,
    counters: &Counters,
    range: Range<usize>,
    worker: usize,
) {
    let mut rng = StdRng::seed_from_u64(rand::random::<u64>() ^ worker as u64);
    let start = range.start;
    for idx in range {
        if rng.gen::<f64>() < config.read_ratio {
            let target = rng.gen_range(start..=idx);
            read_one(engine, config, counters, target);
        } else {
            write_one(engine, config, counters, idx);
        }
    }
}

/// Commit the partition in contiguous `batch_size` chunks, each staged as
/// one atomic batch. A chunk either fully commits or is abandoned at the
/// first failing element, costing exactly one error.
fn batched_loop(
    engine: &dyn KvEngine,
    config: &RunConfig,
    counters: &Counters,
    range: Range<usize>,
) {
    let mut chunk_start = range.start;
    while chunk_start < range.end {
        let chunk_end = (chunk_start + config.batch_size).min(range.end);
        match commit_chunk(engine, config, chunk_start..chunk_end) {
            Ok(()) => counters.add_writes((chunk_end - chunk_start) as u64),
            Err(err) => {
                counters.record_error();
                debug!(chunk_start, %err, "batch chunk failed");
            }
        }
        chunk_start = chunk_end;
    }
}

fn commit_chunk(engine: &dyn KvEngine, config: &RunConfig, chunk: Range<usize>) -> Result<()> {
    let mut batch = engine.batch();
    for idx in chunk {
        let (key, value) = codec::encode_record(idx, config.key_size, config.value_size);
        batch.set(&key, &value)?;
    }
    batch.commit(config.durability)
}

fn write_one(engine: &dyn KvEngine, config: &RunConfig, counters: &Counters, idx: usize) {
    let (key, value) = codec::encode_record(idx, config.key_size, config.value_size);
    match engine.put(&key, &value, config.durability) {
        Ok(()) => counters.record_write(),
        Err(err) => {
            counters.record_error();
            debug!(idx, %err, "write failed");
        }
    }
}

fn read_one(engine: &dyn KvEngine, config: &RunConfig, counters: &Counters, idx: usize) {
    let key = codec::encode_key(idx, config.key_size);
    match engine.get(&key) {
        Ok(Some(_)) => counters.record_read(),
        // Absent keys are expected when reads run ahead of their writes.
        Ok(None) => {}
        Err(err) => {
            counters.record_error();
            debug!(idx, %err, "read failed");
        }
    }
}
