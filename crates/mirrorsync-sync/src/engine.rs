//! The synchronizer: one pass of replica reconciliation

use crate::{
    action_log::{Action, FileActionLog},
    file_set::FileSet,
    plan::SyncPlan,
};
use filetime::FileTime;
use mirrorsync_config::Config;
use mirrorsync_types::{ActionLog, Error, Result, SyncReport};
use std::ffi::OsStr;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;
use std::time::Instant;
use tokio::fs;
use tracing::{debug, info, warn};

/// Options for a synchronizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Create missing parents of the replica directory
    pub create_parents: bool,
    /// Carry access and modification times over when copying new files
    pub preserve_timestamps: bool,
}

impl SyncOptions {
    /// Derive options from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            create_parents: config.replica.create_parents,
            preserve_timestamps: config.replica.preserve_timestamps,
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            create_parents: true,
            preserve_timestamps: true,
        }
    }
}

/// Mirrors the flat file set of a source directory into a replica
///
/// Each call to [`Synchronizer::synchronize`] is independent: both
/// directories are enumerated afresh and nothing is remembered between
/// passes. The phases always run in the same order:
///
/// 1. create the replica directory if it is missing
/// 2. list regular files on both sides
/// 3. copy files missing from the replica
/// 4. remove files the source no longer has
/// 5. rewrite every replica file from its source
///
/// A failure in phases 1-4 aborts the pass. A failure to rewrite a single
/// file in phase 5 is logged and the pass moves on to the next file.
#[derive(Debug)]
pub struct Synchronizer<L = FileActionLog> {
    options: SyncOptions,
    log: L,
}

impl Synchronizer<FileActionLog> {
    /// Synchronizer that appends to the log file at `log_path`
    pub fn with_log_file<P: AsRef<Path>>(log_path: P) -> Self {
        Self::new(FileActionLog::new(log_path), SyncOptions::default())
    }
}

impl<L: ActionLog + Send + Sync> Synchronizer<L> {
    /// Create a synchronizer reporting to `log`
    pub fn new(log: L, options: SyncOptions) -> Self {
        Self { options, log }
    }

    /// The action log this synchronizer writes to
    pub fn log(&self) -> &L {
        &self.log
    }

    /// Run one pass
    pub async fn synchronize(&self, source: &Path, replica: &Path) -> Result<SyncReport> {
        let start_time = Instant::now();
        let mut report = SyncReport::new(uuid::Uuid::new_v4());

        info!(
            pass_id = %report.pass_id,
            "Starting pass: {} -> {}",
            source.display(),
            replica.display()
        );

        self.ensure_replica(replica).await?;

        let source_files = FileSet::scan(source).await?;
        let replica_files = FileSet::scan(replica).await?;
        let plan = SyncPlan::new(&source_files, &replica_files);
        debug!(
            "Plan: {} to copy, {} to delete, {} to refresh",
            plan.to_copy.len(),
            plan.to_delete.len(),
            plan.to_refresh.len()
        );

        self.copy_phase(&plan, source, replica, &mut report).await?;
        self.delete_phase(&plan, replica, &mut report).await?;
        self.refresh_phase(&plan, source, replica, &mut report)
            .await?;

        report.duration = start_time.elapsed();
        info!(
            pass_id = %report.pass_id,
            "Pass completed: {} copied, {} removed, {} updated, {} failed in {:?}",
            report.files_copied,
            report.files_removed,
            report.files_updated,
            report.files_failed,
            report.duration
        );

        Ok(report)
    }

    /// Create the replica directory if it does not exist yet
    async fn ensure_replica(&self, replica: &Path) -> Result<()> {
        match fs::metadata(replica).await {
            Ok(metadata) if metadata.is_dir() => return Ok(()),
            Ok(_) => {
                return Err(Error::setup(replica, "Replica path is not a directory"));
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => return Err(Error::setup(replica, e.to_string())),
        }

        let created = if self.options.create_parents {
            fs::create_dir_all(replica).await
        } else {
            fs::create_dir(replica).await
        };
        created.map_err(|e| {
            Error::setup(
                replica,
                format!("Failed to create replica directory: {}", e),
            )
        })?;

        info!("Created replica directory '{}'", replica.display());
        Ok(())
    }

    async fn copy_phase(
        &self,
        plan: &SyncPlan,
        source: &Path,
        replica: &Path,
        report: &mut SyncReport,
    ) -> Result<()> {
        for name in &plan.to_copy {
            self.copy_file(name, &source.join(name), &replica.join(name))
                .await?;
            self.log.record(&Action::copied(name).to_string()).await?;
            report.files_copied += 1;
        }
        Ok(())
    }

    /// Copy content and permission bits, then the file times if enabled
    async fn copy_file(&self, name: &OsStr, source: &Path, destination: &Path) -> Result<()> {
        let copy_error = |e: std::io::Error| Error::copy(name.to_string_lossy(), e.to_string());

        self.clear_destination(name, destination).await?;
        fs::copy(source, destination).await.map_err(copy_error)?;

        if self.options.preserve_timestamps {
            let metadata = fs::metadata(source).await.map_err(copy_error)?;
            filetime::set_file_times(
                destination,
                FileTime::from_last_access_time(&metadata),
                FileTime::from_last_modification_time(&metadata),
            )
            .map_err(copy_error)?;
        }

        debug!("Copied: {} -> {}", source.display(), destination.display());
        Ok(())
    }

    /// Make room for a copy without following whatever occupies the name
    ///
    /// A name missing from the replica's file set can still be taken by a
    /// symlink or another special entry. Those are unlinked so the copy lands
    /// as a regular file inside the replica. A directory is left alone and
    /// fails the copy.
    async fn clear_destination(&self, name: &OsStr, destination: &Path) -> Result<()> {
        let copy_error = |e: std::io::Error| Error::copy(name.to_string_lossy(), e.to_string());

        let file_type = match fs::symlink_metadata(destination).await {
            Ok(metadata) => metadata.file_type(),
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(copy_error(e)),
        };

        if file_type.is_dir() {
            return Err(Error::copy(
                name.to_string_lossy(),
                "Replica entry is a directory",
            ));
        }
        if !file_type.is_file() {
            fs::remove_file(destination).await.map_err(copy_error)?;
            debug!("Unlinked non-regular entry: {}", destination.display());
        }
        Ok(())
    }

    async fn delete_phase(
        &self,
        plan: &SyncPlan,
        replica: &Path,
        report: &mut SyncReport,
    ) -> Result<()> {
        for name in &plan.to_delete {
            let path = replica.join(name);
            fs::remove_file(&path)
                .await
                .map_err(|e| Error::delete(name.to_string_lossy(), e.to_string()))?;
            debug!("Deleted: {}", path.display());

            self.log.record(&Action::removed(name).to_string()).await?;
            report.files_removed += 1;
        }
        Ok(())
    }

    /// Rewrite every source file into the replica; per-file failures are logged
    async fn refresh_phase(
        &self,
        plan: &SyncPlan,
        source: &Path,
        replica: &Path,
        report: &mut SyncReport,
    ) -> Result<()> {
        for name in &plan.to_refresh {
            match Self::refresh_file(name, &source.join(name), &replica.join(name)).await {
                Ok(bytes) => {
                    self.log.record(&Action::updated(name).to_string()).await?;
                    report.files_updated += 1;
                    report.bytes_refreshed += bytes;
                }
                Err(e) => {
                    warn!("{}", e);
                    self.log
                        .record(&Action::update_failed(name).to_string())
                        .await?;
                    report.files_failed += 1;
                }
            }
        }
        Ok(())
    }

    async fn refresh_file(name: &OsStr, source: &Path, destination: &Path) -> Result<u64> {
        let refresh_error = |e: std::io::Error| Error::refresh(name.to_string_lossy(), e.to_string());

        let target = fs::symlink_metadata(destination)
            .await
            .map_err(refresh_error)?;
        if !target.is_file() {
            return Err(Error::refresh(
                name.to_string_lossy(),
                "Replica entry is not a regular file",
            ));
        }

        let content = fs::read(source).await.map_err(refresh_error)?;
        fs::write(destination, &content)
            .await
            .map_err(refresh_error)?;

        Ok(content.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_log::MemoryActionLog;
    use mirrorsync_types::ErrorKind;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        source: std::path::PathBuf,
        replica: std::path::PathBuf,
        log: MemoryActionLog,
        synchronizer: Synchronizer<MemoryActionLog>,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source");
        let replica = temp_dir.path().join("replica");
        std::fs::create_dir(&source).unwrap();

        let log = MemoryActionLog::new();
        let synchronizer = Synchronizer::new(log.clone(), SyncOptions::default());

        Fixture {
            _temp_dir: temp_dir,
            source,
            replica,
            log,
            synchronizer,
        }
    }

    #[tokio::test]
    async fn test_copy_then_refresh_into_new_replica() {
        let f = fixture();
        std::fs::write(f.source.join("a.txt"), "hello").unwrap();

        let report = f
            .synchronizer
            .synchronize(&f.source, &f.replica)
            .await
            .unwrap();

        assert_eq!(
            f.log.entries(),
            vec!["Copied a.txt to replica", "Updated a.txt in replica"]
        );
        assert_eq!(std::fs::read_to_string(f.replica.join("a.txt")).unwrap(), "hello");
        assert_eq!(report.files_copied, 1);
        assert_eq!(report.files_updated, 1);
        assert_eq!(report.bytes_refreshed, 5);
    }

    #[tokio::test]
    async fn test_phase_order_in_log() {
        let f = fixture();
        std::fs::create_dir(&f.replica).unwrap();
        std::fs::write(f.source.join("new.txt"), "n").unwrap();
        std::fs::write(f.source.join("kept.txt"), "k2").unwrap();
        std::fs::write(f.replica.join("kept.txt"), "k1").unwrap();
        std::fs::write(f.replica.join("stale.txt"), "s").unwrap();

        f.synchronizer
            .synchronize(&f.source, &f.replica)
            .await
            .unwrap();

        assert_eq!(
            f.log.entries(),
            vec![
                "Copied new.txt to replica",
                "Removed stale.txt from replica",
                "Updated kept.txt in replica",
                "Updated new.txt in replica",
            ]
        );
    }

    #[tokio::test]
    async fn test_refresh_failure_is_isolated() {
        let f = fixture();
        std::fs::create_dir(&f.replica).unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            std::fs::write(f.source.join(name), format!("new {}", name)).unwrap();
            std::fs::write(f.replica.join(name), "old").unwrap();
        }

        let source_files = FileSet::scan(&f.source).await.unwrap();
        let replica_files = FileSet::scan(&f.replica).await.unwrap();
        let plan = SyncPlan::new(&source_files, &replica_files);

        // b.txt disappears from the source between enumeration and refresh
        std::fs::remove_file(f.source.join("b.txt")).unwrap();

        let mut report = SyncReport::default();
        f.synchronizer
            .refresh_phase(&plan, &f.source, &f.replica, &mut report)
            .await
            .unwrap();

        assert_eq!(
            f.log.entries(),
            vec![
                "Updated a.txt in replica",
                "Failed to update b.txt in replica (binary file)",
                "Updated c.txt in replica",
            ]
        );
        assert_eq!(report.files_updated, 2);
        assert_eq!(report.files_failed, 1);
        assert_eq!(std::fs::read_to_string(f.replica.join("a.txt")).unwrap(), "new a.txt");
        assert_eq!(std::fs::read_to_string(f.replica.join("b.txt")).unwrap(), "old");
        assert_eq!(std::fs::read_to_string(f.replica.join("c.txt")).unwrap(), "new c.txt");
    }

    #[tokio::test]
    async fn test_copy_failure_aborts_pass() {
        let f = fixture();
        std::fs::create_dir(&f.replica).unwrap();
        std::fs::write(f.source.join("a.txt"), "a").unwrap();
        std::fs::write(f.replica.join("extra.txt"), "x").unwrap();

        let source_files = FileSet::scan(&f.source).await.unwrap();
        let replica_files = FileSet::scan(&f.replica).await.unwrap();
        let plan = SyncPlan::new(&source_files, &replica_files);

        std::fs::remove_file(f.source.join("a.txt")).unwrap();

        let mut report = SyncReport::default();
        let err = f
            .synchronizer
            .copy_phase(&plan, &f.source, &f.replica, &mut report)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Copy);
        assert!(f.log.entries().is_empty());
        assert!(f.replica.join("extra.txt").exists());
    }

    #[tokio::test]
    async fn test_delete_failure_aborts_pass() {
        let f = fixture();
        std::fs::create_dir(&f.replica).unwrap();
        std::fs::write(f.replica.join("extra.txt"), "x").unwrap();

        let source_files = FileSet::scan(&f.source).await.unwrap();
        let replica_files = FileSet::scan(&f.replica).await.unwrap();
        let plan = SyncPlan::new(&source_files, &replica_files);

        std::fs::remove_file(f.replica.join("extra.txt")).unwrap();

        let mut report = SyncReport::default();
        let err = f
            .synchronizer
            .delete_phase(&plan, &f.replica, &mut report)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Delete);
        assert!(f.log.entries().is_empty());
        assert_eq!(report.files_removed, 0);
    }

    #[tokio::test]
    async fn test_copy_onto_replica_directory_fails() {
        let f = fixture();
        std::fs::create_dir_all(f.replica.join("a.txt")).unwrap();
        std::fs::write(f.source.join("a.txt"), "a").unwrap();

        let err = f
            .synchronizer
            .synchronize(&f.source, &f.replica)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Copy);
        assert!(f.replica.join("a.txt").is_dir());
        assert!(f.log.entries().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_refresh_does_not_write_through_symlink() {
        let f = fixture();
        std::fs::create_dir(&f.replica).unwrap();
        let outside = f.source.parent().unwrap().join("outside.txt");
        std::fs::write(&outside, "keep").unwrap();
        std::fs::write(f.source.join("a.txt"), "a").unwrap();
        std::os::unix::fs::symlink(&outside, f.replica.join("a.txt")).unwrap();

        let result = Synchronizer::<MemoryActionLog>::refresh_file(
            OsStr::new("a.txt"),
            &f.source.join("a.txt"),
            &f.replica.join("a.txt"),
        )
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Refresh);
        assert_eq!(std::fs::read_to_string(&outside).unwrap(), "keep");
    }

    #[tokio::test]
    async fn test_replica_path_is_a_file() {
        let f = fixture();
        std::fs::write(&f.replica, "not a dir").unwrap();

        let err = f
            .synchronizer
            .synchronize(&f.source, &f.replica)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Setup);
        assert!(f.log.entries().is_empty());
    }

    #[tokio::test]
    async fn test_missing_parent_without_create_parents() {
        let f = fixture();
        let nested = f.replica.join("deeper");
        let synchronizer = Synchronizer::new(
            f.log.clone(),
            SyncOptions {
                create_parents: false,
                ..SyncOptions::default()
            },
        );

        let err = synchronizer
            .synchronize(&f.source, &nested)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Setup);

        f.synchronizer
            .synchronize(&f.source, &nested)
            .await
            .unwrap();
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_missing_source_is_setup_error() {
        let f = fixture();
        let err = f
            .synchronizer
            .synchronize(&f.source.join("absent"), &f.replica)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Setup);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_preserves_mode() {
        use std::os::unix::fs::PermissionsExt;

        let f = fixture();
        let script = f.source.join("run.sh");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o750)).unwrap();

        f.synchronizer
            .synchronize(&f.source, &f.replica)
            .await
            .unwrap();

        let mode = std::fs::metadata(f.replica.join("run.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[tokio::test]
    async fn test_copy_file_preserves_mtime() {
        let f = fixture();
        std::fs::create_dir(&f.replica).unwrap();
        let source = f.source.join("dated.txt");
        let destination = f.replica.join("dated.txt");
        std::fs::write(&source, "x").unwrap();
        let past = FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_mtime(&source, past).unwrap();

        f.synchronizer
            .copy_file(OsStr::new("dated.txt"), &source, &destination)
            .await
            .unwrap();

        let metadata = std::fs::metadata(&destination).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&metadata), past);
    }
}
