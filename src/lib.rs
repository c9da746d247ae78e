//! kvgauge - concurrent measurement harness for embedded key-value engines.
//!
//! Quantifies two things about an ordered key-value storage engine under
//! configurable concurrent load:
//!
//! - raw throughput of reads, writes, and batched writes under `Sync` and
//!   `NoSync` durability, and
//! - write-visibility latency: the delay between a write being accepted and
//!   that key becoming observable to an independent concurrent reader.
//!
//! The engine itself is an external collaborator consumed through the
//! [`KvEngine`] trait; a RocksDB adapter is bundled as [`RocksEngine`].
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use kvgauge::{run, KvEngine, RocksEngine, RunConfig, RunReport};
//!
//! # fn main() -> kvgauge::Result<()> {
//! let engine: Arc<dyn KvEngine> = Arc::new(RocksEngine::open_temp()?);
//! let config = RunConfig {
//!     op_count: 100_000,
//!     workers: 8,
//!     ..RunConfig::default()
//! };
//! let outcome = run(engine, &config)?;
//! println!("{}", RunReport::new(&config, &outcome));
//! # Ok(())
//! # }
//! ```
//!
//! # Error policy
//!
//! Setup faults (engine open, invalid configuration) abort a run and are
//! returned as [`Error`]. Per-operation engine faults are swallowed into the
//! error counter so one failing key never halts the remaining workers.
//! `NotFound` on read is an expected condition, not an error; a visibility
//! probe that exhausts its attempt budget is a recorded miss, not a fault.

pub mod codec;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod visibility;

mod error;

pub use config::{DurabilityMode, RunConfig, VisibilityConfig};
pub use engine::{EngineConfig, KvEngine, KvIter, RocksEngine, StagedBatch};
pub use error::{Error, Result};
pub use metrics::{Counters, LatencySlots, Stats, MISS_SENTINEL};
pub use report::{LatencyHistogram, LatencySummary, RunReport, VisibilityReport};
pub use runner::{preload, run, RunOutcome};
pub use visibility::{run_visibility, VisibilityOutcome};
