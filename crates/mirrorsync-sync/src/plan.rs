//! Reconciliation plan derived from two file sets

use crate::file_set::FileSet;
use std::ffi::OsString;

/// The actions one pass performs, in phase order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Present in the source, missing from the replica
    pub to_copy: Vec<OsString>,
    /// Present in the replica, missing from the source
    pub to_delete: Vec<OsString>,
    /// Every source file; rewritten unconditionally
    pub to_refresh: Vec<OsString>,
}

impl SyncPlan {
    /// Compare a source and replica file set
    pub fn new(source: &FileSet, replica: &FileSet) -> Self {
        Self {
            to_copy: source.difference(replica).cloned().collect(),
            to_delete: replica.difference(source).cloned().collect(),
            to_refresh: source.iter().cloned().collect(),
        }
    }

    /// Whether the replica's file set already matches the source
    pub fn names_match(&self) -> bool {
        self.to_copy.is_empty() && self.to_delete.is_empty()
    }
}
