//! Core data types for MirrorSync

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Unique identifier for a synchronization pass
pub type PassId = uuid::Uuid;

/// Outcome counters for one completed synchronization pass
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncReport {
    /// Pass identifier, used to correlate tracing output
    pub pass_id: PassId,
    /// Files copied into the replica because they were missing
    pub files_copied: u64,
    /// Files removed from the replica because the source no longer has them
    pub files_removed: u64,
    /// Files whose replica content was rewritten from the source
    pub files_updated: u64,
    /// Files whose refresh failed and was logged
    pub files_failed: u64,
    /// Bytes written during the refresh phase
    pub bytes_refreshed: u64,
    /// Wall-clock duration of the pass
    pub duration: Duration,
}

impl SyncReport {
    /// Create an empty report for a new pass
    pub fn new(pass_id: PassId) -> Self {
        Self {
            pass_id,
            files_copied: 0,
            files_removed: 0,
            files_updated: 0,
            files_failed: 0,
            bytes_refreshed: 0,
            duration: Duration::default(),
        }
    }

    /// Whether the pass changed the replica's file set
    pub fn changed_file_set(&self) -> bool {
        self.files_copied > 0 || self.files_removed > 0
    }

    /// Whether every refresh in the pass succeeded
    pub fn is_clean(&self) -> bool {
        self.files_failed == 0
    }
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::new(uuid::Uuid::new_v4())
    }
}
