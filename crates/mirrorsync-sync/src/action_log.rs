//! Action log: the append-only record of what each pass changed

use async_trait::async_trait;
use chrono::{DateTime, Local};
use mirrorsync_types::{ActionLog, Error, Result};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Timestamp layout of a log line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An effectful step of a pass, rendered as its log message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A missing file was copied into the replica
    Copied(String),
    /// An extra file was removed from the replica
    Removed(String),
    /// A replica file was rewritten from its source
    Updated(String),
    /// Rewriting a replica file failed
    UpdateFailed(String),
}

impl Action {
    /// Build an action for a directory entry name
    pub fn copied(name: &OsStr) -> Self {
        Self::Copied(name.to_string_lossy().into_owned())
    }

    /// See [`Action::copied`]
    pub fn removed(name: &OsStr) -> Self {
        Self::Removed(name.to_string_lossy().into_owned())
    }

    /// See [`Action::copied`]
    pub fn updated(name: &OsStr) -> Self {
        Self::Updated(name.to_string_lossy().into_owned())
    }

    /// See [`Action::copied`]
    pub fn update_failed(name: &OsStr) -> Self {
        Self::UpdateFailed(name.to_string_lossy().into_owned())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copied(name) => write!(f, "Copied {} to replica", name),
            Self::Removed(name) => write!(f, "Removed {} from replica", name),
            Self::Updated(name) => write!(f, "Updated {} in replica", name),
            Self::UpdateFailed(name) => {
                write!(f, "Failed to update {} in replica (binary file)", name)
            }
        }
    }
}

/// Render one log line, newline included
pub fn format_entry(timestamp: &DateTime<Local>, message: &str) -> String {
    format!("{}: {}\n", timestamp.format(TIMESTAMP_FORMAT), message)
}

/// Appends timestamped lines to a file and echoes the bare message to stdout
#[derive(Debug, Clone)]
pub struct FileActionLog {
    path: PathBuf,
    echo: bool,
}

impl FileActionLog {
    /// Log to `path`, echoing to stdout
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            echo: true,
        }
    }

    /// Enable or disable the stdout echo
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ActionLog for FileActionLog {
    async fn record(&self, message: &str) -> Result<()> {
        let line = format_entry(&Local::now(), message);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| Error::log(&self.path, e.to_string()))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| Error::log(&self.path, e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| Error::log(&self.path, e.to_string()))?;

        if self.echo {
            println!("{}", message);
        }

        Ok(())
    }
}

/// Keeps messages in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryActionLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl MemoryActionLog {
    /// Create an empty in-memory log
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far, oldest first
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Drop every recorded message
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

#[async_trait]
impl ActionLog for MemoryActionLog {
    async fn record(&self, message: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mirrorsync_types::ErrorKind;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case(Action::Copied("a.txt".into()), "Copied a.txt to replica")]
    #[case(Action::Removed("old.txt".into()), "Removed old.txt from replica")]
    #[case(Action::Updated("a.txt".into()), "Updated a.txt in replica")]
    #[case(
        Action::UpdateFailed("img.png".into()),
        "Failed to update img.png in replica (binary file)"
    )]
    fn test_action_messages(#[case] action: Action, #[case] expected: &str) {
        assert_eq!(action.to_string(), expected);
    }

    #[test]
    fn test_format_entry() {
        let timestamp = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            format_entry(&timestamp, "Copied a.txt to replica"),
            "2024-03-09 07:05:01: Copied a.txt to replica\n"
        );
    }

    #[tokio::test]
    async fn test_file_log_appends() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sync.log");
        std::fs::write(&path, "2000-01-01 00:00:00: earlier\n").unwrap();

        let log = FileActionLog::new(&path).with_echo(false);
        log.record("Updated a.txt in replica").await.unwrap();
        log.record("Removed b.txt from replica").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "2000-01-01 00:00:00: earlier");
        assert!(lines[1].ends_with(": Updated a.txt in replica"));
        assert!(lines[2].ends_with(": Removed b.txt from replica"));
        // "YYYY-MM-DD HH:MM:SS" is 19 characters
        assert_eq!(&lines[1][19..21], ": ");
    }

    #[tokio::test]
    async fn test_file_log_unwritable_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("sync.log");

        let err = FileActionLog::new(&path)
            .with_echo(false)
            .record("Copied a.txt to replica")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Log);
    }

    #[tokio::test]
    async fn test_memory_log_shares_buffer() {
        let log = MemoryActionLog::new();
        let handle = log.clone();

        log.record("Copied a.txt to replica").await.unwrap();
        assert_eq!(handle.entries(), vec!["Copied a.txt to replica"]);

        handle.clear();
        assert!(log.entries().is_empty());
    }
}
