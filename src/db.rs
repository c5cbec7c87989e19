//! Database types and global state

use std::path::Path;
use std::sync::{Mutex, OnceLock};

use heed::types::{Str, U64};
use heed::{Database, Env, EnvOpenOptions, RoTxn};

use crate::config::Config;
use crate::constants::{TABLE_ADV_PERMISSION, TABLE_META, TABLE_PRIVILEGES_UPDATER};
use crate::error::{AdvPermError, Result};

/// Rows keyed by big-endian id, stored as JSON text
pub type RowDb = Database<U64<byteorder::BigEndian>, Str>;
/// JSON text keyed by a string key
pub type KeyedDb = Database<Str, Str>;
/// Counters keyed by name
pub type SeqDb = Database<Str, U64<byteorder::BigEndian>>;

/// All database handles
pub struct Dbs {
    pub rules: RowDb,
    pub updater: KeyedDb,
    pub meta: SeqDb,
}

// Global state
pub static ENV: OnceLock<Env> = OnceLock::new();
pub static DBS: OnceLock<Dbs> = OnceLock::new();
pub static TEST_LOCK: Mutex<()> = Mutex::new(());
pub static INIT_PATH: OnceLock<String> = OnceLock::new();

/// Get the database handles, or error if not initialized
#[inline]
pub fn dbs() -> Result<&'static Dbs> {
    DBS.get().ok_or(AdvPermError::NotInitialized)
}

/// Get the environment, or error if not initialized
#[inline]
pub fn env() -> Result<&'static Env> {
    ENV.get().ok_or(AdvPermError::NotInitialized)
}

/// Execute a read-only operation
#[inline]
pub fn read<T, F: FnOnce(&Dbs, &RoTxn) -> Result<T>>(f: F) -> Result<T> {
    let txn = env()?.read_txn()?;
    f(dbs()?, &txn)
}

/// Initialize the store at `path` with the default map size
pub fn init(path: &str) -> Result<()> {
    init_with(&Config::default().with_db_path(path))
}

/// Initialize the store described by `config`
///
/// Calling it again with the same path is a no-op; a different path is an error.
pub fn init_with(config: &Config) -> Result<()> {
    let path = config.db_path.as_str();
    if let Some(p) = INIT_PATH.get() {
        return if p == path {
            Ok(())
        } else {
            Err(AdvPermError::AlreadyInitialized(p.clone()))
        };
    }
    std::fs::create_dir_all(path)?;
    // SAFETY: LMDB requires no other processes access this path concurrently during open.
    let e = unsafe {
        EnvOpenOptions::new()
            .map_size(config.map_size)
            .max_dbs(3)
            .open(Path::new(path))?
    };
    let mut tx = e.write_txn()?;
    let d = Dbs {
        rules: e.create_database(&mut tx, Some(TABLE_ADV_PERMISSION))?,
        updater: e.create_database(&mut tx, Some(TABLE_PRIVILEGES_UPDATER))?,
        meta: e.create_database(&mut tx, Some(TABLE_META))?,
    };
    tx.commit()?;
    let _ = (ENV.set(e), DBS.set(d), INIT_PATH.set(path.to_string()));
    tracing::info!(path, map_size = config.map_size, "advperm store opened");
    Ok(())
}

/// Clear all tables (for testing)
pub fn clear_all() -> Result<()> {
    crate::tx::transact(|tx| {
        let d = tx.dbs();
        d.rules.clear(tx.tx())?;
        d.updater.clear(tx.tx())?;
        d.meta.clear(tx.tx())?;
        Ok(())
    })
}

/// Get the test lock (for single-threaded tests)
pub fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}
