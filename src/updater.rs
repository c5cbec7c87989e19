//! Queue of modules whose permissions must be recalculated

use serde::{Deserialize, Serialize};

use crate::constants::{UPDATER_DEFAULT_PRIORITY, UPDATER_KIND_MODULE, UPDATER_MODULE_RECORD};
use crate::db::read;
use crate::error::Result;
use crate::tx::{decode, transact};

/// One queued recalculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdaterEntry {
    pub module: String,
    /// 0 for the whole module
    pub record: u64,
    pub priority: u8,
    pub kind: u8,
}

impl UpdaterEntry {
    /// Whole-module recalculation, as queued by rule writes
    pub fn for_module(module: &str) -> Self {
        UpdaterEntry {
            module: module.to_string(),
            record: UPDATER_MODULE_RECORD,
            priority: UPDATER_DEFAULT_PRIORITY,
            kind: UPDATER_KIND_MODULE,
        }
    }

    pub(crate) fn key(&self) -> String {
        key(&self.module, self.record)
    }
}

fn key(module: &str, record: u64) -> String {
    format!("{}/{}", module, record)
}

/// Queue a recalculation; false if one is already queued for the pair
pub fn set_updater(module: &str, record: u64, priority: u8, kind: u8) -> Result<bool> {
    let entry = UpdaterEntry { module: module.to_string(), record, priority, kind };
    let queued = transact(|tx| tx.queue_updater(&entry))?;
    if queued {
        tracing::info!(module, record, "permission recalculation queued");
    }
    Ok(queued)
}

/// Queue a whole-module recalculation
pub fn set_module_updater(module: &str) -> Result<bool> {
    let entry = UpdaterEntry::for_module(module);
    set_updater(&entry.module, entry.record, entry.priority, entry.kind)
}

/// All queued entries, highest priority first
pub fn pending() -> Result<Vec<UpdaterEntry>> {
    let mut r: Vec<UpdaterEntry> = read(|d, tx| {
        let mut r = Vec::new();
        for item in d.updater.iter(tx)? {
            let (_, json) = item?;
            r.push(decode(json)?);
        }
        Ok(r)
    })?;
    r.sort_by(|a, b| b.priority.cmp(&a.priority));
    Ok(r)
}

/// Whether a module has anything queued
pub fn is_pending(module: &str) -> Result<bool> {
    Ok(pending()?.iter().any(|e| e.module == module))
}

/// Remove a processed entry
pub fn remove(module: &str, record: u64) -> Result<bool> {
    transact(|tx| tx.delete_updater(&key(module, record)))
}

/// Drop every queued entry
pub fn clear() -> Result<()> {
    transact(|tx| {
        let d = tx.dbs();
        d.updater.clear(tx.tx())?;
        Ok(())
    })
}
