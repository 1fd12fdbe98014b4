//! Error types for clausum.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for clausum operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while creating, restoring or verifying a container.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error not attributable to a more specific step.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source path does not exist.
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    /// Source path is neither a regular file nor a directory.
    #[error("Source is neither a file nor a directory: {0}")]
    NotFileOrDirectory(PathBuf),

    /// Destination directory could not be created or used.
    #[error("Cannot use destination {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A container already exists at the final path.
    #[error("Container already exists: {0}")]
    ContainerExists(PathBuf),

    /// Restore directory already exists and is not an empty directory.
    #[error("Restore directory already exists: {0}")]
    RestoreTargetExists(PathBuf),

    /// Archive base name is empty or contains path separators.
    #[error("Invalid archive name: {0:?}")]
    InvalidName(String),

    /// Failure while walking or reading source members.
    #[error("Packing failed: {0}")]
    ArchivePack(String),

    /// Failure while extracting members.
    #[error("Extraction failed after {extracted} member(s): {reason}")]
    ArchiveUnpack { reason: String, extracted: usize },

    /// Container is too short to hold a salt.
    #[error("Not a container: {len} bytes is shorter than the {expected}-byte salt")]
    ContainerFormat { len: usize, expected: usize },

    /// Wrong passphrase or tampered ciphertext. The two are indistinguishable.
    #[error("Wrong password or corrupted file")]
    Authentication,

    /// Decrypted archive failed its structural check.
    #[error("Archive is corrupt at member: {0}")]
    ArchiveCorrupt(String),

    /// Encryption primitive failed.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// New passphrase rejected by the front-end policy.
    #[error("Passphrase rejected: {0}")]
    PassphrasePolicy(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse failure categories surfaced to front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Path,
    ArchivePack,
    ArchiveUnpack,
    ContainerFormat,
    Authentication,
    ArchiveCorrupt,
    Policy,
    Config,
    Io,
}

impl ErrorKind {
    /// Short human label for the kind.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Path => "path error",
            ErrorKind::ArchivePack => "archive pack error",
            ErrorKind::ArchiveUnpack => "archive unpack error",
            ErrorKind::ContainerFormat => "container format error",
            ErrorKind::Authentication => "authentication error",
            ErrorKind::ArchiveCorrupt => "archive corrupt",
            ErrorKind::Policy => "passphrase policy",
            ErrorKind::Config => "configuration error",
            ErrorKind::Io => "I/O error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::SourceNotFound(_)
            | Error::NotFileOrDirectory(_)
            | Error::Destination { .. }
            | Error::ContainerExists(_)
            | Error::RestoreTargetExists(_)
            | Error::InvalidName(_) => ErrorKind::Path,
            Error::ArchivePack(_) => ErrorKind::ArchivePack,
            Error::ArchiveUnpack { .. } => ErrorKind::ArchiveUnpack,
            Error::ContainerFormat { .. } => ErrorKind::ContainerFormat,
            Error::Authentication => ErrorKind::Authentication,
            Error::ArchiveCorrupt(_) => ErrorKind::ArchiveCorrupt,
            Error::PassphrasePolicy(_) => ErrorKind::Policy,
            Error::InvalidConfig(_) | Error::Serialization(_) => ErrorKind::Config,
            Error::Io(_) | Error::Encryption(_) => ErrorKind::Io,
        }
    }

    /// Guidance line for a user-facing summary, if there is one.
    pub fn hint(&self) -> Option<&'static str> {
        if let Error::RestoreTargetExists(_) = self {
            return Some("choose another destination or move the existing directory away");
        }
        match self.kind() {
            ErrorKind::Authentication => {
                Some("check the passphrase; if it is right, the container has been modified")
            }
            ErrorKind::ArchiveUnpack => {
                Some("files extracted before the failure were left in place")
            }
            ErrorKind::ContainerFormat => Some("the file is not a clausum container"),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Self {
        Error::ArchivePack(e.to_string())
    }
}
