//! Core types and error handling for MirrorSync
//!
//! This crate provides the error taxonomy, pass report and the action log
//! seam shared by the MirrorSync crates.
//!
//! # Features
//!
//! - `async`: Enable async trait definitions
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use mirrorsync_types::{Error, ErrorKind, Result, SyncReport};
//!
//! fn example_pass() -> Result<SyncReport> {
//!     let mut report = SyncReport::default();
//!     report.files_updated = 3;
//!     Ok(report)
//! }
//!
//! let err = Error::refresh("a.txt", "Permission denied");
//! assert_eq!(err.kind(), ErrorKind::Refresh);
//! assert!(err.is_recoverable());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{Error, ErrorKind, ErrorSeverity};
pub use result::Result;
pub use traits::*;
pub use types::*;
