//! Flat file set enumeration

use mirrorsync_types::{Error, Result};
use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Base names of the regular files directly inside a directory
///
/// Subdirectories, symbolic links and special files are never members, and
/// nothing below the top level is visited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    names: BTreeSet<OsString>,
}

impl FileSet {
    /// Create an empty file set
    pub fn new() -> Self {
        Self::default()
    }

    /// List the regular files directly inside `dir`
    pub async fn scan<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut names = BTreeSet::new();

        let mut entries = fs::read_dir(dir).await.map_err(|e| {
            Error::setup(dir, format!("Failed to read directory: {}", e))
        })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            Error::setup(dir, format!("Failed to read directory entry: {}", e))
        })? {
            // DirEntry::file_type does not follow symlinks
            let file_type = entry.file_type().await.map_err(|e| {
                Error::setup(
                    entry.path(),
                    format!("Failed to get file type: {}", e),
                )
            })?;

            if file_type.is_file() {
                names.insert(entry.file_name());
            } else {
                debug!("Ignoring non-regular entry: {}", entry.path().display());
            }
        }

        debug!("Scanned {} files in '{}'", names.len(), dir.display());
        Ok(Self { names })
    }

    /// Whether `name` is a member
    pub fn contains<N: AsRef<OsStr>>(&self, name: N) -> bool {
        self.names.contains(name.as_ref())
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set has no members
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Members in name order
    pub fn iter(&self) -> impl Iterator<Item = &OsString> {
        self.names.iter()
    }

    /// Members of `self` that are not in `other`
    pub fn difference<'a>(&'a self, other: &'a Self) -> impl Iterator<Item = &'a OsString> {
        self.names.difference(&other.names)
    }
}

impl<N: Into<OsString>> FromIterator<N> for FileSet {
    fn from_iter<I: IntoIterator<Item = N>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
