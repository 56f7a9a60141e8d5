use super::{MemoryStore, RecordStore};
use crate::{Error, Result};

/// Memory store whose writes can be rejected to simulate an unavailable backend.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    /// Reject every write.
    pub writes_fail: bool,
    /// Accept this many more writes, reject the next one, then recover.
    pub fail_after: Option<usize>,
}

impl FlakyStore {
    fn check(&mut self) -> Result<()> {
        if self.writes_fail {
            return Err(Error::StoreUnavailable("write rejected".to_owned()));
        }
        match self.fail_after {
            Some(0) => {
                self.fail_after = None;
                Err(Error::StoreUnavailable("write interrupted".to_owned()))
            }
            Some(left) => {
                self.fail_after = Some(left - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl RecordStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.check()?;
        self.inner.put(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.check()?;
        self.inner.delete(key)
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.inner.scan_prefix(prefix)
    }
}
