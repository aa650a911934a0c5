//! Fixtures for source/replica directory pairs

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary workspace holding a source directory, a replica path and a
/// log file path
///
/// The replica directory is not created; the first pass does that.
pub struct MirrorFixture {
    temp_dir: TempDir,
    /// Source directory (created)
    pub source: PathBuf,
    /// Replica directory (not created)
    pub replica: PathBuf,
    /// Action log file (not created)
    pub log_file: PathBuf,
}

impl MirrorFixture {
    /// Create a fresh fixture
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let source = temp_dir.path().join("source");
        fs::create_dir(&source)?;

        Ok(Self {
            source,
            replica: temp_dir.path().join("replica"),
            log_file: temp_dir.path().join("sync.log"),
            temp_dir,
        })
    }

    /// Root of the temporary workspace
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file into the source directory
    pub fn write_source(&self, name: &str, content: impl AsRef<[u8]>) -> std::io::Result<()> {
        fs::write(self.source.join(name), content)
    }

    /// Write a file into the replica directory, creating it if needed
    pub fn write_replica(&self, name: &str, content: impl AsRef<[u8]>) -> std::io::Result<()> {
        fs::create_dir_all(&self.replica)?;
        fs::write(self.replica.join(name), content)
    }

    /// Regular files directly in the source, by name
    pub fn source_files(&self) -> std::io::Result<BTreeMap<String, Vec<u8>>> {
        read_flat_dir(&self.source)
    }

    /// Regular files directly in the replica, by name
    pub fn replica_files(&self) -> std::io::Result<BTreeMap<String, Vec<u8>>> {
        read_flat_dir(&self.replica)
    }

    /// Messages in the action log, timestamps stripped
    pub fn log_messages(&self) -> std::io::Result<Vec<String>> {
        if !self.log_file.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read_to_string(&self.log_file)?
            .lines()
            .map(strip_timestamp)
            .map(str::to_string)
            .collect())
    }
}

/// Drop the leading `YYYY-MM-DD HH:MM:SS: ` from a log line
pub fn strip_timestamp(line: &str) -> &str {
    line.get(21..).unwrap_or(line)
}

/// Read every regular file directly inside `dir`
pub fn read_flat_dir(dir: &Path) -> std::io::Result<BTreeMap<String, Vec<u8>>> {
    let mut files = BTreeMap::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            let name = entry.file_name().to_string_lossy().into_owned();
            files.insert(name, fs::read(entry.path())?);
        }
    }
    Ok(files)
}

/// Deterministic binary content that is not valid UTF-8
pub fn binary_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| ((i * 7 + 13) % 256) as u8).collect()
}
