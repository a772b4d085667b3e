//! Path-based access rules

use std::collections::BTreeSet;

use palaver_storage_traits::{StoreError, StorePath};

/// Read and write denials, each covering a path and everything below it.
#[derive(Debug, Clone, Default)]
pub struct AccessRules {
    denied_reads: BTreeSet<StorePath>,
    denied_writes: BTreeSet<StorePath>,
}

impl AccessRules {
    /// Rules that allow everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny reads at and below `path`
    pub fn deny_read(&mut self, path: StorePath) {
        self.denied_reads.insert(path);
    }

    /// Deny writes at and below `path`
    pub fn deny_write(&mut self, path: StorePath) {
        self.denied_writes.insert(path);
    }

    /// Builder form of [`Self::deny_read`]
    pub fn with_denied_read(mut self, path: StorePath) -> Self {
        self.deny_read(path);
        self
    }

    /// Builder form of [`Self::deny_write`]
    pub fn with_denied_write(mut self, path: StorePath) -> Self {
        self.deny_write(path);
        self
    }

    pub(crate) fn check_read(&self, path: &StorePath) -> Result<(), StoreError> {
        if self.denied_reads.iter().any(|rule| rule.is_ancestor_of(path)) {
            return Err(StoreError::PermissionDenied(format!("read {path}")));
        }
        Ok(())
    }

    pub(crate) fn check_write(&self, path: &StorePath) -> Result<(), StoreError> {
        if self.denied_writes.iter().any(|rule| rule.overlaps(path)) {
            return Err(StoreError::PermissionDenied(format!("write {path}")));
        }
        Ok(())
    }
}
