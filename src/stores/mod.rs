//! Storage layer for the ledger. Provides:
//! - The [`RecordStore`] contract every backend implements
//! - An ordered in-memory backend ([`MemoryStore`])
//! - A write-buffering overlay that makes one operation all-or-nothing ([`UnitOfWork`])
//!
//! Keys and values are opaque to this layer. Entity encoding and key
//! namespacing live in [`crate::codec`].

mod memory;
mod unit_of_work;

pub use memory::MemoryStore;
pub use unit_of_work::UnitOfWork;

#[cfg(test)]
pub(crate) mod testing;

use crate::Result;

/// A single pending mutation: `Some(bytes)` is a put, `None` is a delete.
pub type PendingWrite = (String, Option<Vec<u8>>);

/// Flat key-value persistence supplied by the execution environment.
pub trait RecordStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Deleting an absent key is not an error.
    fn delete(&mut self, key: &str) -> Result<()>;

    /// Returns every entry whose key starts with `prefix`, ordered by key.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>>;

    /// Applies writes in the given order. Backends with native batches should
    /// override this to make the flush atomic.
    fn write_batch(&mut self, batch: Vec<PendingWrite>) -> Result<()> {
        for (key, value) in batch {
            match value {
                Some(bytes) => self.put(&key, bytes)?,
                None => self.delete(&key)?,
            }
        }
        Ok(())
    }
}
