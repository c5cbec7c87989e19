//! Transaction wrapper for table writes

use heed::RwTxn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants::SEQ_ADV_PERMISSION;
use crate::db::{dbs, env, Dbs};
use crate::error::Result;
use crate::rule::RuleRow;
use crate::updater::UpdaterEntry;

/// Transaction wrapper for table writes
pub struct Tx {
    txn: RwTxn<'static>,
    dbs: &'static Dbs,
}

impl Tx {
    #[inline]
    pub(crate) fn new() -> Result<Self> {
        Ok(Tx {
            txn: env()?.write_txn()?,
            dbs: dbs()?,
        })
    }

    #[inline]
    pub(crate) fn tx(&mut self) -> &mut RwTxn<'static> {
        &mut self.txn
    }

    #[inline]
    pub(crate) fn dbs(&self) -> &'static Dbs {
        self.dbs
    }

    #[inline]
    pub(crate) fn commit(self) -> Result<()> {
        Ok(self.txn.commit()?)
    }

    /// Insert a rule row under a freshly allocated id
    pub fn insert_rule(&mut self, row: &RuleRow) -> Result<u64> {
        let id = self.next_id(SEQ_ADV_PERMISSION)?;
        self.put_json_row(id, row)?;
        self.set_next_id(SEQ_ADV_PERMISSION, id + 1)?;
        Ok(id)
    }

    /// Overwrite an existing rule row; false if there is no row with that id
    pub fn update_rule(&mut self, id: u64, row: &RuleRow) -> Result<bool> {
        if self.dbs.rules.get(&self.txn, &id)?.is_none() {
            return Ok(false);
        }
        self.put_json_row(id, row)?;
        Ok(true)
    }

    /// Delete a rule row
    pub fn delete_rule(&mut self, id: u64) -> Result<bool> {
        Ok(self.dbs.rules.delete(&mut self.txn, &id)?)
    }

    /// Queue an updater entry unless one already exists under `key`
    pub fn put_updater_if_absent(&mut self, key: &str, entry: &UpdaterEntry) -> Result<bool> {
        if self.dbs.updater.get(&self.txn, key)?.is_some() {
            return Ok(false);
        }
        let json = serde_json::to_string(entry)?;
        self.dbs.updater.put(&mut self.txn, key, &json)?;
        Ok(true)
    }

    /// Queue an updater entry under its (module, record) key
    pub fn queue_updater(&mut self, entry: &UpdaterEntry) -> Result<bool> {
        self.put_updater_if_absent(&entry.key(), entry)
    }

    /// Remove an updater entry
    pub fn delete_updater(&mut self, key: &str) -> Result<bool> {
        Ok(self.dbs.updater.delete(&mut self.txn, key)?)
    }

    fn put_json_row<T: Serialize>(&mut self, id: u64, row: &T) -> Result<()> {
        let json = serde_json::to_string(row)?;
        Ok(self.dbs.rules.put(&mut self.txn, &id, &json)?)
    }

    pub(crate) fn next_id(&mut self, seq: &str) -> Result<u64> {
        Ok(self.dbs.meta.get(&self.txn, seq)?.unwrap_or(1))
    }

    pub(crate) fn set_next_id(&mut self, seq: &str, id: u64) -> Result<()> {
        Ok(self.dbs.meta.put(&mut self.txn, seq, &id)?)
    }
}

/// Decode a JSON row read from a table
pub(crate) fn decode<T: DeserializeOwned>(json: &str) -> Result<T> {
    Ok(serde_json::from_str(json)?)
}

/// Run multiple operations in a single transaction
#[inline]
pub fn transact<T, F: FnOnce(&mut Tx) -> Result<T>>(f: F) -> Result<T> {
    let mut tx = Tx::new()?;
    let r = f(&mut tx)?;
    tx.commit()?;
    Ok(r)
}
