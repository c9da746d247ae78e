//! RocksDB adapter for [`KvEngine`].
//!
//! Maps the harness durability modes onto per-write sync options: `Sync`
//! forces an fsync before the write returns, `NoSync` returns once the
//! change is in the WAL buffer. When no storage path is given the handle
//! owns a temp directory, so the backing files are removed on every exit
//! path.

use rocksdb::{
    BlockBasedOptions, Cache, DBRawIterator, Env, Options, WriteBatch, WriteOptions, DB,
};
use tempfile::TempDir;
use tracing::debug;

use crate::config::DurabilityMode;
use crate::engine::{EngineConfig, KvEngine, KvIter, StagedBatch};
use crate::error::{Error, Result};

/// An open RocksDB instance measured by the harness.
pub struct RocksEngine {
    db: DB,
    // Held for lifetime only: the env must outlive the DB, the temp dir is
    // removed on drop.
    _env: Option<Env>,
    _temp: Option<TempDir>,
}

impl RocksEngine {
    /// Open an engine with the given options.
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_bytes);
        opts.set_max_background_jobs(config.max_background_jobs);

        let cache = Cache::new_lru_cache(config.cache_bytes);
        let mut table_opts = BlockBasedOptions::default();
        table_opts.set_block_cache(&cache);
        opts.set_block_based_table_factory(&table_opts);

        if let Some(wal_dir) = &config.wal_dir {
            opts.set_wal_dir(wal_dir);
        }

        let mut env = None;
        if config.in_memory {
            let mem_env = Env::mem_env()?;
            opts.set_env(&mem_env);
            env = Some(mem_env);
        }

        let (path, temp) = match &config.path {
            Some(path) => (path.clone(), None),
            None => {
                let dir = tempfile::tempdir()?;
                (dir.path().to_path_buf(), Some(dir))
            }
        };

        let db = DB::open(&opts, &path)?;
        debug!(path = %path.display(), in_memory = config.in_memory, "engine opened");
        Ok(Self {
            db,
            _env: env,
            _temp: temp,
        })
    }

    /// Open an engine on a scoped temp directory with default options.
    pub fn open_temp() -> Result<Self> {
        Self::open(&EngineConfig::default())
    }
}

fn write_options(durability: DurabilityMode) -> WriteOptions {
    let mut opts = WriteOptions::default();
    opts.set_sync(durability.is_sync());
    opts
}

impl KvEngine for RocksEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?)
    }

    fn put(&self, key: &[u8], value: &[u8], durability: DurabilityMode) -> Result<()> {
        self.db.put_opt(key, value, &write_options(durability))?;
        Ok(())
    }

    fn delete(&self, key: &[u8], durability: DurabilityMode) -> Result<()> {
        self.db.delete_opt(key, &write_options(durability))?;
        Ok(())
    }

    fn batch(&self) -> Box<dyn StagedBatch + '_> {
        Box::new(RocksBatch {
            db: &self.db,
            staged: Some(WriteBatch::default()),
        })
    }

    fn iter(&self) -> Result<Box<dyn KvIter + '_>> {
        Ok(Box::new(RocksIter {
            inner: self.db.raw_iterator(),
        }))
    }
}

struct RocksBatch<'a> {
    db: &'a DB,
    staged: Option<WriteBatch>,
}

impl StagedBatch for RocksBatch<'_> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let staged = self.staged.as_mut().ok_or(Error::BatchConsumed)?;
        staged.put(key, value);
        Ok(())
    }

    fn commit(&mut self, durability: DurabilityMode) -> Result<()> {
        let staged = self.staged.take().ok_or(Error::BatchConsumed)?;
        self.db.write_opt(staged, &write_options(durability))?;
        Ok(())
    }
}

struct RocksIter<'a> {
    inner: DBRawIterator<'a>,
}

impl KvIter for RocksIter<'_> {
    fn seek(&mut self, key: &[u8]) {
        self.inner.seek(key);
    }

    fn seek_to_first(&mut self) {
        self.inner.seek_to_first();
    }

    fn valid(&self) -> bool {
        self.inner.valid()
    }

    fn next(&mut self) {
        self.inner.next();
    }

    fn key(&self) -> Option<&[u8]> {
        self.inner.key()
    }

    fn value(&self) -> Option<&[u8]> {
        self.inner.value()
    }

    fn status(&self) -> Result<()> {
        self.inner.status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete_roundtrip() {
        let engine = RocksEngine::open_temp().expect("open engine");
        engine
            .put(b"alpha", b"one", DurabilityMode::NoSync)
            .expect("put");
        assert_eq!(engine.get(b"alpha").expect("get"), Some(b"one".to_vec()));

        engine.delete(b"alpha", DurabilityMode::NoSync).expect("delete");
        assert_eq!(engine.get(b"alpha").expect("get after delete"), None);
    }

    #[test]
    fn test_missing_key_is_none_not_error() {
        let engine = RocksEngine::open_temp().expect("open engine");
        assert_eq!(engine.get(b"never-written").expect("get"), None);
    }

    #[test]
    fn test_sync_put_is_immediately_readable() {
        let engine = RocksEngine::open_temp().expect("open engine");
        engine
            .put(b"durable", b"yes", DurabilityMode::Sync)
            .expect("sync put");
        assert_eq!(engine.get(b"durable").expect("get"), Some(b"yes".to_vec()));
    }

    #[test]
    fn test_batch_commits_atomically() {
        let engine = RocksEngine::open_temp().expect("open engine");
        let mut batch = engine.batch();
        batch.set(b"b1", b"v1").expect("stage");
        batch.set(b"b2", b"v2").expect("stage");
        batch.commit(DurabilityMode::NoSync).expect("commit");

        assert_eq!(engine.get(b"b1").expect("get"), Some(b"v1".to_vec()));
        assert_eq!(engine.get(b"b2").expect("get"), Some(b"v2".to_vec()));
    }

    #[test]
    fn test_second_commit_is_rejected() {
        let engine = RocksEngine::open_temp().expect("open engine");
        let mut batch = engine.batch();
        batch.set(b"k", b"v").expect("stage");
        batch.commit(DurabilityMode::NoSync).expect("commit");
        assert!(matches!(
            batch.commit(DurabilityMode::NoSync),
            Err(Error::BatchConsumed)
        ));
    }

    #[test]
    fn test_scan_prefix_stops_at_prefix_boundary() {
        let engine = RocksEngine::open_temp().expect("open engine");
        for (key, value) in [("test1", "a"), ("test2", "b"), ("other1", "c")] {
            engine
                .put(key.as_bytes(), value.as_bytes(), DurabilityMode::NoSync)
                .expect("put");
        }

        let records = engine.scan_prefix(b"test").expect("scan");
        let keys: Vec<_> = records.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![b"test1".as_slice(), b"test2".as_slice()]);
    }

    #[test]
    fn test_in_memory_engine_roundtrip() {
        let engine = RocksEngine::open(&EngineConfig::in_memory()).expect("open in-memory");
        engine
            .put(b"ephemeral", b"data", DurabilityMode::NoSync)
            .expect("put");
        assert_eq!(
            engine.get(b"ephemeral").expect("get"),
            Some(b"data".to_vec())
        );
    }
}
