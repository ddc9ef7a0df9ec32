//! Durable key-value backends for the persistence adapter.
//!
//! Records are stored as UTF-8 JSON strings under fixed keys. [`LmdbStore`]
//! writes every batch inside one LMDB write transaction, so records written
//! together (specifications and products after an import) commit together.
//! [`MemoryStore`] keeps the same contract in process memory.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{info, warn};

use crate::error::{ComparisonError, Result};

const DATABASE_NAME: &str = "comparison";

/// A durable store of string records.
pub trait DurableStore {
    /// Reads one record; `Ok(None)` when the key was never written.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Writes every entry at a single commit point.
    fn write_batch(&self, entries: &[(&str, String)]) -> Result<()>;
}

pub struct LmdbStore {
    env: Environment,
    db: Database,
    path: PathBuf,
}

impl LmdbStore {
    /// Opens (or creates) the environment at `<name>.lmdb`.
    pub fn open(name: &str, map_size: usize) -> Result<Self> {
        let path = PathBuf::from(format!("{name}.lmdb"));
        if !path.exists() {
            info!("Creating comparison store at: {}", path.display());
            fs::create_dir_all(&path)?;
        }

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(map_size)
            .open(&path)
            .inspect_err(|e| warn!("Failed to open LMDB environment at {}: {e}", path.display()))?;
        let db = env.create_db(Some(DATABASE_NAME), DatabaseFlags::empty())?;

        info!("Comparison store opened at: {}", path.display());
        Ok(Self { env, db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DurableStore for LmdbStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let txn = self.env.begin_ro_txn()?;
        let value = match txn.get(self.db, &key) {
            Ok(bytes) => Some(String::from_utf8(bytes.to_vec()).map_err(|e| {
                ComparisonError::Serialization(format!("Record '{key}' is not valid UTF-8: {e}"))
            })?),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        txn.commit()?;
        Ok(value)
    }

    fn write_batch(&self, entries: &[(&str, String)]) -> Result<()> {
        let mut txn = self.env.begin_rw_txn()?;
        for (key, value) in entries {
            txn.put(self.db, key, value, WriteFlags::empty())?;
        }
        txn.commit()?;
        Ok(())
    }
}

/// In-memory store for sessions that need no durability. Tests can make its
/// writes fail to exercise quota handling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent write fails with a storage error while set.
    #[cfg(test)]
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Stores raw bytes as-is, bypassing serialization.
    #[cfg(test)]
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.records
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    #[cfg(test)]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.records.borrow().get(key).cloned()
    }
}

impl DurableStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.borrow().get(key).cloned())
    }

    fn write_batch(&self, entries: &[(&str, String)]) -> Result<()> {
        if self.fail_writes.get() {
            return Err(ComparisonError::Storage("quota exceeded".to_string()));
        }
        let mut records = self.records.borrow_mut();
        for (key, value) in entries {
            records.insert(key.to_string(), value.clone());
        }
        Ok(())
    }
}

/// Shared references are stores too, so tests can keep a handle on the
/// backend they hand to a session.
#[cfg(test)]
impl<S: DurableStore + ?Sized> DurableStore for std::rc::Rc<S> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write_batch(&self, entries: &[(&str, String)]) -> Result<()> {
        (**self).write_batch(entries)
    }
}
