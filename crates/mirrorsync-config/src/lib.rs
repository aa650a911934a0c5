//! Configuration management for MirrorSync
//!
//! Configuration is layered: built-in defaults, then an optional YAML, TOML or
//! JSON file, then environment variables, then whatever the command line
//! supplies. The command line always has the last word.
//!
//! # Examples
//!
//! ```rust
//! use mirrorsync_config::ConfigBuilder;
//!
//! let mut config = ConfigBuilder::new()
//!     .add_source_file("mirrorsync.yaml")
//!     .add_env_prefix("MIRRORSYNC")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! config.sync.source = Some("data".into());
//! config.sync.replica = Some("backup".into());
//! config.log.file = Some("sync.log".into());
//!
//! let target = config.target().expect("paths are set");
//! assert_eq!(target.replica, std::path::PathBuf::from("backup"));
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Tracing levels accepted by `logging.level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for MirrorSync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// What to mirror and how often
    pub sync: SyncSettings,
    /// Replica directory handling
    pub replica: ReplicaConfig,
    /// Action log destination
    pub log: LogConfig,
    /// Diagnostic tracing
    pub logging: LoggingConfig,
}

/// Source, replica and pass interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Directory whose flat file set is mirrored
    pub source: Option<PathBuf>,
    /// Directory kept in lock-step with the source
    pub replica: Option<PathBuf>,
    /// Seconds to sleep between the end of one pass and the start of the next
    pub interval_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            source: None,
            replica: None,
            interval_secs: 60,
        }
    }
}

/// Replica directory handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicaConfig {
    /// Create missing parent directories of the replica
    pub create_parents: bool,
    /// Carry access and modification times over when copying new files
    pub preserve_timestamps: bool,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            create_parents: true,
            preserve_timestamps: true,
        }
    }
}

/// Action log destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// File the timestamped action lines are appended to
    pub file: Option<PathBuf>,
    /// Echo each action message to standard output
    pub echo: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            echo: true,
        }
    }
}

/// Diagnostic tracing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing level when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Fully resolved paths for a synchronization pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Source directory
    pub source: PathBuf,
    /// Replica directory
    pub replica: PathBuf,
    /// Action log file
    pub log_file: PathBuf,
}

impl Config {
    /// Interval between passes
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.sync.interval_secs)
    }

    /// Resolve the three required paths
    pub fn target(&self) -> ConfigResult<SyncTarget> {
        let source = self
            .sync
            .source
            .clone()
            .ok_or_else(|| ConfigError::missing_required("sync.source"))?;
        let replica = self
            .sync
            .replica
            .clone()
            .ok_or_else(|| ConfigError::missing_required("sync.replica"))?;
        let log_file = self
            .log
            .file
            .clone()
            .ok_or_else(|| ConfigError::missing_required("log.file"))?;

        Ok(SyncTarget {
            source,
            replica,
            log_file,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.sync.interval_secs == 0 {
            return Err(ConfigError::validation(
                "Interval must be at least 1 second",
            ));
        }

        if let (Some(source), Some(replica)) = (&self.sync.source, &self.sync.replica) {
            if source == replica {
                return Err(ConfigError::validation(
                    "Source and replica must be different directories",
                ));
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::validation(
                "Log level must be one of: trace, debug, info, warn, error",
            ));
        }

        Ok(())
    }
}
