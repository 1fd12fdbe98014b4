//! Password and integrity verification without extraction.

use crate::archive::{self, CheckReport};
use crate::container;
use crate::crypto::{Cipher, KeyDerivation};
use crate::error::{Error, Result};
use crate::progress::{Phase, ProgressSink, Tracker};
use tracing::debug;
use zeroize::Zeroizing;

/// Result of verifying a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Passphrase is correct and every archive member is intact.
    Ok(CheckReport),
    /// Authentication failed: wrong passphrase or modified container.
    WrongPasswordOrCorrupt,
    /// Decryption succeeded but the named member failed its checksum.
    ArchiveCorrupt(String),
}

impl VerifyOutcome {
    /// Whether verification passed.
    pub fn is_ok(&self) -> bool {
        matches!(self, VerifyOutcome::Ok(_))
    }

    /// Turn a failed outcome into the matching error.
    pub fn into_result(self) -> Result<CheckReport> {
        match self {
            VerifyOutcome::Ok(report) => Ok(report),
            VerifyOutcome::WrongPasswordOrCorrupt => Err(Error::Authentication),
            VerifyOutcome::ArchiveCorrupt(name) => Err(Error::ArchiveCorrupt(name)),
        }
    }
}

/// Checks a container's passphrase and contents entirely in memory.
#[derive(Debug, Clone, Copy)]
pub struct IntegrityVerifier {
    kdf: KeyDerivation,
}

impl IntegrityVerifier {
    pub fn new(kdf: KeyDerivation) -> Self {
        Self { kdf }
    }

    /// Verify container bytes.
    ///
    /// Progress: 0-75 while deriving and decrypting, 75-100 while checking.
    /// Only a container shorter than a salt is an `Err`; every other failure
    /// is an outcome.
    pub fn verify(
        &self,
        container_bytes: &[u8],
        passphrase: &str,
        progress: &dyn ProgressSink,
    ) -> Result<VerifyOutcome> {
        let mut tracker = Tracker::new(progress);
        let container = container::decode(container_bytes)?;

        tracker.emit(0, Phase::Decrypting);
        let key = self.kdf.derive(passphrase, &container.salt);
        tracker.emit(25, Phase::Decrypting);

        let plaintext = match Cipher::new(&key).decrypt(&container.token) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(Error::Authentication) => return Ok(VerifyOutcome::WrongPasswordOrCorrupt),
            Err(e) => return Err(e),
        };
        drop(key);
        tracker.emit(75, Phase::Checking);

        let report = match archive::check(&plaintext, &mut |done, total| {
            tracker.span(Phase::Checking, 75, 100, done, total)
        }) {
            Ok(report) => report,
            Err(Error::ArchiveCorrupt(name)) => return Ok(VerifyOutcome::ArchiveCorrupt(name)),
            Err(e) => return Err(e),
        };
        debug!(files = report.files, directories = report.directories, "archive intact");

        tracker.emit(100, Phase::Done);
        Ok(VerifyOutcome::Ok(report))
    }
}
