//! Write-buffering overlay that turns a sequence of store calls into one
//! all-or-nothing unit.
//!
//! Reads go to the pending writes first and fall through to the underlying
//! store. Nothing reaches the underlying store until [`UnitOfWork::commit`];
//! dropping an uncommitted unit discards every buffered write. A flush that
//! the store rejects partway through is undone by writing back the values the
//! touched keys held before the flush.

use std::collections::BTreeMap;

use tracing::warn;

use super::{PendingWrite, RecordStore};
use crate::Result;

pub struct UnitOfWork<'s, S: RecordStore + ?Sized> {
    base: &'s mut S,
    /// Latest pending state per key. `None` marks a pending delete.
    pending: BTreeMap<String, Option<Vec<u8>>>,
}

impl<'s, S: RecordStore + ?Sized> UnitOfWork<'s, S> {
    pub fn new(base: &'s mut S) -> Self {
        Self {
            base,
            pending: BTreeMap::new(),
        }
    }

    /// Number of distinct keys this unit would write on commit.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Flushes the pending writes to the underlying store in key order.
    ///
    /// If the store fails mid-flush, every touched key is restored to its
    /// prior value before the error is returned.
    pub fn commit(self) -> Result<usize> {
        let mut undo: Vec<PendingWrite> = Vec::with_capacity(self.pending.len());
        for key in self.pending.keys() {
            undo.push((key.clone(), self.base.get(key)?));
        }

        let batch: Vec<PendingWrite> = self.pending.into_iter().collect();
        let written = batch.len();
        if let Err(err) = self.base.write_batch(batch) {
            if let Err(undo_err) = self.base.write_batch(undo) {
                warn!(error = %undo_err, "could not restore records after a failed flush");
            }
            return Err(err);
        }
        Ok(written)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for UnitOfWork<'_, S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.pending.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.base.get(key),
        }
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.pending.insert(key.to_owned(), Some(value));
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.pending.insert(key.to_owned(), None);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let mut merged: BTreeMap<String, Vec<u8>> =
            self.base.scan_prefix(prefix)?.into_iter().collect();
        let overlay = self
            .pending
            .range(prefix.to_owned()..)
            .take_while(|(key, _)| key.starts_with(prefix));
        for (key, value) in overlay {
            match value {
                Some(bytes) => {
                    merged.insert(key.clone(), bytes.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}
