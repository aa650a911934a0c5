//! Error types and handling for MirrorSync
//!
//! Errors are grouped by the phase of a synchronization pass that produced
//! them. Setup, copy, delete and log failures abort the pass; refresh failures
//! are the only ones the synchronizer recovers from on its own.

use std::path::PathBuf;

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Low severity - the pass can continue
    Low,
    /// Medium severity - the pass should be retried later
    Medium,
    /// High severity - the pass must be aborted
    High,
    /// Critical severity - the process should be terminated
    Critical,
}

/// Main error type for MirrorSync operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Replica directory could not be prepared or a directory could not be listed
    #[error("Setup failed for '{path}': {message}")]
    Setup {
        /// Directory involved in the failure
        path: PathBuf,
        /// Underlying error message
        message: String,
    },

    /// Copying a new file into the replica failed
    #[error("Failed to copy '{name}' to replica: {message}")]
    Copy {
        /// Base name of the file
        name: String,
        /// Underlying error message
        message: String,
    },

    /// Removing an extra file from the replica failed
    #[error("Failed to remove '{name}' from replica: {message}")]
    Delete {
        /// Base name of the file
        name: String,
        /// Underlying error message
        message: String,
    },

    /// Rewriting a replica file from its source failed
    #[error("Failed to refresh '{name}': {message}")]
    Refresh {
        /// Base name of the file
        name: String,
        /// Underlying error message
        message: String,
    },

    /// Appending to the action log failed
    #[error("Failed to write action log '{path}': {message}")]
    Log {
        /// Path to the log file
        path: PathBuf,
        /// Underlying error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Replica preparation and directory listing
    Setup,
    /// Copy phase
    Copy,
    /// Delete phase
    Delete,
    /// Refresh phase
    Refresh,
    /// Action log
    Log,
    /// Configuration errors
    Config,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Setup { .. } => ErrorKind::Setup,
            Self::Copy { .. } => ErrorKind::Copy,
            Self::Delete { .. } => ErrorKind::Delete,
            Self::Refresh { .. } => ErrorKind::Refresh,
            Self::Log { .. } => ErrorKind::Log,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Setup { .. } => ErrorSeverity::Critical,
            Self::Copy { .. } | Self::Delete { .. } => ErrorSeverity::High,
            Self::Refresh { .. } => ErrorSeverity::Low,
            Self::Log { .. } => ErrorSeverity::High,
            Self::Config { .. } => ErrorSeverity::Critical,
        }
    }

    /// Check if the synchronizer can keep going within the current pass
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Refresh { .. })
    }

    /// Create a new setup error
    pub fn setup<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Setup {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new copy error
    pub fn copy<N: Into<String>, S: Into<String>>(name: N, message: S) -> Self {
        Self::Copy {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a new delete error
    pub fn delete<N: Into<String>, S: Into<String>>(name: N, message: S) -> Self {
        Self::Delete {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a new refresh error
    pub fn refresh<N: Into<String>, S: Into<String>>(name: N, message: S) -> Self {
        Self::Refresh {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a new action log error
    pub fn log<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Log {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
