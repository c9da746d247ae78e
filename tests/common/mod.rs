//! Shared test utilities for the integration suites.
//!
//! Import via `mod common;` from any test file.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use kvgauge::{
    DurabilityMode, EngineConfig, Error, KvEngine, KvIter, Result, RocksEngine, StagedBatch,
};

static INIT_TRACING: Once = Once::new();

/// Route tracing output through the test harness, once per process.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Engine on a scoped temp directory with default options.
pub fn temp_engine() -> Arc<dyn KvEngine> {
    init_tracing();
    Arc::new(RocksEngine::open_temp().expect("open temp engine"))
}

/// Engine backed by in-memory storage.
pub fn mem_engine() -> Arc<dyn KvEngine> {
    init_tracing();
    Arc::new(RocksEngine::open(&EngineConfig::in_memory()).expect("open in-memory engine"))
}

// ============================================================================
// Fault injection
// ============================================================================

/// Engine wrapper that fails batch staging for one poisoned key, for
/// exercising all-or-nothing chunk semantics.
pub struct PoisonedEngine {
    inner: Arc<dyn KvEngine>,
    poison_key: Vec<u8>,
}

impl PoisonedEngine {
    pub fn new(inner: Arc<dyn KvEngine>, poison_key: Vec<u8>) -> Self {
        Self { inner, poison_key }
    }
}

impl KvEngine for PoisonedEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8], durability: DurabilityMode) -> Result<()> {
        self.inner.put(key, value, durability)
    }

    fn delete(&self, key: &[u8], durability: DurabilityMode) -> Result<()> {
        self.inner.delete(key, durability)
    }

    fn batch(&self) -> Box<dyn StagedBatch + '_> {
        Box::new(PoisonedBatch {
            inner: self.inner.batch(),
            poison_key: self.poison_key.clone(),
        })
    }

    fn iter(&self) -> Result<Box<dyn KvIter + '_>> {
        self.inner.iter()
    }
}

struct PoisonedBatch<'a> {
    inner: Box<dyn StagedBatch + 'a>,
    poison_key: Vec<u8>,
}

impl StagedBatch for PoisonedBatch<'_> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if key == self.poison_key.as_slice() {
            return Err(Error::Engine("injected staging fault".to_string()));
        }
        self.inner.set(key, value)
    }

    fn commit(&mut self, durability: DurabilityMode) -> Result<()> {
        self.inner.commit(durability)
    }
}
