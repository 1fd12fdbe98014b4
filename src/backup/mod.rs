//! Create, restore and verify backup containers.
//!
//! [`Backup`] is the only entry point front ends need. Each call runs the
//! whole pipeline synchronously on the calling thread; run it on a worker and
//! watch progress through a channel to keep an interactive thread responsive.

mod operations;

pub use operations::{restored_dir_name, Backup};

use crate::archive::{SkippedItem, UnpackReport};
use std::path::PathBuf;

/// Result of a successful create.
#[derive(Debug, Clone)]
pub struct CreateReport {
    /// Final container path.
    pub container: PathBuf,
    /// Archive members (files and directories).
    pub entries: usize,
    /// Regular files archived.
    pub files: usize,
    /// Sum of uncompressed file sizes.
    pub source_bytes: u64,
    /// Container size on disk.
    pub container_bytes: usize,
    /// Source items left out by the symlink/special-file policy.
    pub skipped: Vec<SkippedItem>,
    /// Whether the container was marked read-only.
    pub read_only: bool,
    /// Non-fatal problems, such as failing to mark the container read-only.
    pub warnings: Vec<String>,
}

/// Result of a successful restore.
#[derive(Debug, Clone)]
pub struct RestoreReport {
    /// Directory the archive was extracted into.
    pub directory: PathBuf,
    /// What was extracted.
    pub unpacked: UnpackReport,
}
