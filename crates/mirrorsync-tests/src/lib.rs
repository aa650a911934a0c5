//! MirrorSync testing support
//!
//! Shared fixtures for the cross-crate integration tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified test utilities
pub mod test_utils;
