//! Packing sources into a single archive and extracting it again.
//!
//! Archives are ZIP files held entirely in memory. Member names are
//! `/`-separated and relative; directories end in `/`.

mod entry_path;
mod pack;
mod unpack;

pub use entry_path::EntryPath;
pub use unpack::{check, CheckReport, UnpackReport, ARCHIVE_INDEX};

use crate::config::{BackupConfig, Compression, SymlinkPolicy};
use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroizing;

/// One member of a packed archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Member path inside the archive.
    pub path: EntryPath,
    /// Uncompressed size in bytes (0 for directories).
    pub size: u64,
}

/// A source item that was deliberately left out of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub path: PathBuf,
    pub reason: &'static str,
}

/// A packed archive. The plaintext buffer is wiped when dropped.
pub struct Archive {
    bytes: Zeroizing<Vec<u8>>,
    entries: Vec<ArchiveEntry>,
    skipped: Vec<SkippedItem>,
}

impl Archive {
    /// Serialized archive bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Members in insertion order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Items the symlink/special-file policy left out.
    pub fn skipped(&self) -> &[SkippedItem] {
        &self.skipped
    }

    /// Number of regular file members.
    pub fn file_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.path.is_dir()).count()
    }

    /// Sum of uncompressed member sizes.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("len", &self.bytes.len())
            .field("entries", &self.entries.len())
            .field("skipped", &self.skipped)
            .finish()
    }
}

/// Packs and unpacks archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct Archiver {
    compression: Compression,
    symlinks: SymlinkPolicy,
}

impl Archiver {
    /// Create an archiver with explicit policies.
    pub fn new(compression: Compression, symlinks: SymlinkPolicy) -> Self {
        Self {
            compression,
            symlinks,
        }
    }
}

impl From<&BackupConfig> for Archiver {
    fn from(config: &BackupConfig) -> Self {
        Self::new(config.compression, config.symlinks)
    }
}
