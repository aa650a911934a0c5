//! Core traits for MirrorSync
//!
//! The synchronizer reports every effectful step through an [`ActionLog`].
//! Production code appends to a file; tests can capture entries in memory.

use crate::Result;

#[cfg(feature = "async")]
use async_trait::async_trait;

/// Destination for the human-readable record of synchronization actions
#[cfg_attr(feature = "async", async_trait)]
pub trait ActionLog {
    /// Record a single action message
    #[cfg(feature = "async")]
    async fn record(&self, message: &str) -> Result<()>;

    /// Record a single action message (sync version)
    #[cfg(not(feature = "async"))]
    fn record(&self, message: &str) -> Result<()>;
}
