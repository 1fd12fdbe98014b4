//! Backup pipeline operations.

use crate::archive::Archiver;
use crate::backup::{CreateReport, RestoreReport};
use crate::config::{BackupConfig, RESTORED_SUFFIX};
use crate::container::{self, container_file_name, mark_read_only, persist_container, read_container};
use crate::crypto::{Cipher, KeyDerivation, Salt};
use crate::error::{Error, Result};
use crate::progress::{Phase, ProgressSink, Tracker};
use crate::verify::{IntegrityVerifier, VerifyOutcome};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// The backup orchestrator.
#[derive(Debug, Clone)]
pub struct Backup {
    config: BackupConfig,
}

impl Backup {
    /// Create an orchestrator with a validated configuration.
    pub fn new(config: BackupConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    fn kdf(&self) -> KeyDerivation {
        KeyDerivation::new(self.config.work_factor)
    }

    fn archiver(&self) -> Archiver {
        Archiver::from(&self.config)
    }

    /// Pack `source`, encrypt it and write `<destination>/<archive_name>.enc`.
    ///
    /// # Arguments
    ///
    /// * `source` - File or directory to protect
    /// * `destination` - Directory that receives the container (created if missing)
    /// * `archive_name` - Container base name; `.enc` is appended unless present
    /// * `passphrase` - Passphrase; length policy is the caller's job
    /// * `progress` - Receives Packing 0-50, Deriving/Encrypting 50-90, Persisting 90-100
    pub fn create(
        &self,
        source: &Path,
        destination: &Path,
        archive_name: &str,
        passphrase: &str,
        progress: &dyn ProgressSink,
    ) -> Result<CreateReport> {
        self.create_inner(source, destination, archive_name, passphrase, progress)
            .inspect_err(|e| warn!(kind = %e.kind(), error = %e, "create failed"))
    }

    fn create_inner(
        &self,
        source: &Path,
        destination: &Path,
        archive_name: &str,
        passphrase: &str,
        progress: &dyn ProgressSink,
    ) -> Result<CreateReport> {
        let mut tracker = Tracker::new(progress);
        let final_path = final_container_path(destination, archive_name)?;
        if final_path.exists() {
            return Err(Error::ContainerExists(final_path));
        }

        tracker.emit(0, Phase::Packing);
        let archive = self.archiver().pack(source, &mut |done, total| {
            tracker.span(Phase::Packing, 0, 50, done, total)
        })?;
        debug!(
            entries = archive.entries().len(),
            len = archive.bytes().len(),
            "archive packed"
        );

        tracker.emit(50, Phase::Deriving);
        let salt = Salt::generate();
        let key = self.kdf().derive(passphrase, &salt);

        tracker.emit(75, Phase::Encrypting);
        let token = Cipher::new(&key).encrypt(archive.bytes())?;
        drop(key);

        tracker.emit(90, Phase::Persisting);
        fs::create_dir_all(destination).map_err(|source| Error::Destination {
            path: destination.to_path_buf(),
            source,
        })?;
        let bytes = container::encode(&salt, &token);
        persist_container(&bytes, &final_path)?;

        let mut warnings = Vec::new();
        let read_only = if self.config.read_only {
            match mark_read_only(&final_path) {
                Ok(()) => true,
                Err(e) => {
                    warn!(path = %final_path.display(), error = %e, "could not mark container read-only");
                    warnings.push(format!("could not mark container read-only: {}", e));
                    false
                }
            }
        } else {
            false
        };

        tracker.emit(100, Phase::Done);
        info!(
            path = %final_path.display(),
            entries = archive.entries().len(),
            size = bytes.len(),
            "container created"
        );

        Ok(CreateReport {
            container: final_path,
            entries: archive.entries().len(),
            files: archive.file_count(),
            source_bytes: archive.total_size(),
            container_bytes: bytes.len(),
            skipped: archive.skipped().to_vec(),
            read_only,
            warnings,
        })
    }

    /// Decrypt a container and extract it to `<destination>/<stem>_restored`.
    ///
    /// The restore directory must not exist yet (an empty directory is
    /// accepted). Nothing is written unless decryption succeeds. If extraction fails
    /// midway, the members already written stay on disk and the error says how
    /// many there were.
    pub fn restore(
        &self,
        container_path: &Path,
        destination: &Path,
        passphrase: &str,
        progress: &dyn ProgressSink,
    ) -> Result<RestoreReport> {
        self.restore_inner(container_path, destination, passphrase, progress)
            .inspect_err(|e| warn!(kind = %e.kind(), error = %e, "restore failed"))
    }

    fn restore_inner(
        &self,
        container_path: &Path,
        destination: &Path,
        passphrase: &str,
        progress: &dyn ProgressSink,
    ) -> Result<RestoreReport> {
        let mut tracker = Tracker::new(progress);
        let target = destination.join(restored_dir_name(container_path)?);
        ensure_fresh_target(&target)?;

        let bytes = read_container(container_path)?;
        let container = container::decode(&bytes)?;

        tracker.emit(0, Phase::Decrypting);
        let key = self.kdf().derive(passphrase, &container.salt);
        tracker.emit(25, Phase::Decrypting);
        let plaintext = Zeroizing::new(Cipher::new(&key).decrypt(&container.token)?);
        drop(key);

        tracker.emit(50, Phase::Unpacking);
        let unpacked = self.archiver().unpack(&plaintext, &target, &mut |done, total| {
            tracker.span(Phase::Unpacking, 50, 100, done, total)
        })?;

        tracker.emit(100, Phase::Done);
        info!(
            path = %target.display(),
            files = unpacked.files,
            directories = unpacked.directories,
            "container restored"
        );

        Ok(RestoreReport {
            directory: target,
            unpacked,
        })
    }

    /// Check the passphrase and every archive member without writing anything.
    pub fn verify(
        &self,
        container_path: &Path,
        passphrase: &str,
        progress: &dyn ProgressSink,
    ) -> Result<VerifyOutcome> {
        let bytes = read_container(container_path)?;
        let outcome = IntegrityVerifier::new(self.kdf()).verify(&bytes, passphrase, progress)?;

        match &outcome {
            VerifyOutcome::Ok(report) => {
                info!(path = %container_path.display(), files = report.files, "container verified")
            }
            other => warn!(path = %container_path.display(), outcome = ?other, "verification failed"),
        }
        Ok(outcome)
    }
}

/// Name of the directory a container restores into: `<stem>_restored`.
pub fn restored_dir_name(container_path: &Path) -> Result<String> {
    container_path
        .file_stem()
        .map(|stem| format!("{}{}", stem.to_string_lossy(), RESTORED_SUFFIX))
        .ok_or_else(|| Error::InvalidName(container_path.display().to_string()))
}

/// Restore into a missing or empty real directory only.
fn ensure_fresh_target(target: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(target) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(source) => {
            return Err(Error::Destination {
                path: target.to_path_buf(),
                source,
            })
        }
    };
    if !meta.is_dir() {
        return Err(Error::RestoreTargetExists(target.to_path_buf()));
    }
    let mut entries = fs::read_dir(target).map_err(|source| Error::Destination {
        path: target.to_path_buf(),
        source,
    })?;
    if entries.next().is_some() {
        return Err(Error::RestoreTargetExists(target.to_path_buf()));
    }
    Ok(())
}

/// Container path for a destination directory and base name.
fn final_container_path(destination: &Path, archive_name: &str) -> Result<PathBuf> {
    Ok(destination.join(container_file_name(archive_name)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use tempfile::TempDir;

    fn fast() -> Backup {
        Backup::new(BackupConfig::default().with_work_factor(1_000)).unwrap()
    }

    #[test]
    fn test_restored_dir_name() {
        assert_eq!(
            restored_dir_name(Path::new("/backups/photos.enc")).unwrap(),
            "photos_restored"
        );
        assert_eq!(
            restored_dir_name(Path::new("taxes.2024.enc")).unwrap(),
            "taxes.2024_restored"
        );
        assert!(restored_dir_name(Path::new("/")).is_err());
    }

    #[test]
    fn test_final_container_path() {
        let path = final_container_path(Path::new("/backups"), "photos").unwrap();
        assert_eq!(path, Path::new("/backups/photos.enc"));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(Backup::new(BackupConfig::default().with_work_factor(0)).is_err());
    }

    #[test]
    fn test_create_refuses_existing_container() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, b"data").unwrap();
        fs::write(dir.path().join("backup.enc"), b"older").unwrap();

        let result = fast().create(&src, dir.path(), "backup", "passphrase-123", &NoProgress);

        assert!(matches!(result, Err(Error::ContainerExists(_))));
        assert_eq!(fs::read(dir.path().join("backup.enc")).unwrap(), b"older");
    }

    #[test]
    fn test_create_missing_source_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out");

        let result = fast().create(
            &dir.path().join("missing"),
            &dest,
            "backup",
            "passphrase-123",
            &NoProgress,
        );

        assert!(matches!(result, Err(Error::SourceNotFound(_))));
        assert!(!dest.exists());
    }

    #[test]
    fn test_restore_short_container() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.enc");
        fs::write(&path, b"too short").unwrap();

        let result = fast().restore(&path, dir.path(), "passphrase-123", &NoProgress);

        assert!(matches!(result, Err(Error::ContainerFormat { .. })));
        assert!(!dir.path().join("tiny_restored").exists());
    }

    #[test]
    fn test_restore_refuses_populated_target() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, b"data").unwrap();
        let backup = fast();
        let created = backup
            .create(&src, dir.path(), "backup", "passphrase-123", &NoProgress)
            .unwrap();
        let target = dir.path().join("backup_restored");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("a.txt"), b"keep me").unwrap();

        let result = backup.restore(&created.container, dir.path(), "passphrase-123", &NoProgress);

        assert!(matches!(result, Err(Error::RestoreTargetExists(_))));
        assert_eq!(fs::read(target.join("a.txt")).unwrap(), b"keep me");
    }

    #[test]
    fn test_restore_accepts_empty_target() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, b"data").unwrap();
        let backup = fast();
        let created = backup
            .create(&src, dir.path(), "backup", "passphrase-123", &NoProgress)
            .unwrap();
        fs::create_dir(dir.path().join("backup_restored")).unwrap();

        let report = backup
            .restore(&created.container, dir.path(), "passphrase-123", &NoProgress)
            .unwrap();

        assert_eq!(fs::read(report.directory.join("a.txt")).unwrap(), b"data");
    }

    #[cfg(unix)]
    #[test]
    fn test_restore_refuses_symlinked_target() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, b"data").unwrap();
        let outside = dir.path().join("outside");
        fs::create_dir(&outside).unwrap();
        let backup = fast();
        let created = backup
            .create(&src, dir.path(), "backup", "passphrase-123", &NoProgress)
            .unwrap();
        std::os::unix::fs::symlink(&outside, dir.path().join("backup_restored")).unwrap();

        let result = backup.restore(&created.container, dir.path(), "passphrase-123", &NoProgress);

        assert!(matches!(result, Err(Error::RestoreTargetExists(_))));
        assert!(!outside.join("a.txt").exists());
    }
}
