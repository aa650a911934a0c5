//! One-way flat directory mirroring for MirrorSync
//!
//! This crate keeps a replica directory's regular files identical to those of
//! a source directory:
//!
//! - **File sets**: non-recursive listing of regular files on both sides
//! - **Plans**: set differences deciding what to copy, delete and refresh
//! - **Action log**: timestamped, append-only record of every change
//! - **Synchronizer**: executes one pass, isolating per-file refresh failures
//! - **Scheduler**: repeats passes at a fixed interval until shut down
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! # async fn example() -> mirrorsync_types::Result<()> {
//! let report = mirrorsync_sync::synchronize(
//!     Path::new("source"),
//!     Path::new("replica"),
//!     Path::new("sync.log"),
//! )
//! .await?;
//! println!("{} files updated", report.files_updated);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod action_log;
pub mod engine;
pub mod file_set;
pub mod plan;
pub mod scheduler;

pub use action_log::{Action, FileActionLog, MemoryActionLog};
pub use engine::{SyncOptions, Synchronizer};
pub use file_set::FileSet;
pub use plan::SyncPlan;
pub use scheduler::{shutdown_channel, ShutdownSignal, ShutdownTrigger, SyncLoop};

pub use mirrorsync_types::SyncReport;

use mirrorsync_types::Result;
use std::path::Path;

/// Run a single pass with default options, logging to `log_path`
pub async fn synchronize(source: &Path, replica: &Path, log_path: &Path) -> Result<SyncReport> {
    Synchronizer::with_log_file(log_path)
        .synchronize(source, replica)
        .await
}
