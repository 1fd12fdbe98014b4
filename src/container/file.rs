//! Reading and persisting container files.

use crate::config::CONTAINER_EXTENSION;
use crate::error::{Error, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Build the container file name for an archive base name.
///
/// Appends `.enc` unless already present. The base name must be a single
/// non-empty path component.
pub fn container_file_name(base_name: &str) -> Result<String> {
    let trimmed = base_name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains('/')
        || trimmed.contains('\\')
    {
        return Err(Error::InvalidName(base_name.to_string()));
    }

    let suffix = format!(".{}", CONTAINER_EXTENSION);
    if trimmed.ends_with(&suffix) {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{}{}", trimmed, suffix))
    }
}

/// Read a whole container file.
pub fn read_container(path: &Path) -> Result<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(Error::SourceNotFound(path.to_path_buf()))
        }
        Err(e) => Err(Error::Io(e)),
    }
}

/// Write container bytes so the final path only ever holds a complete file.
///
/// Data goes to a temporary file in the same directory, is synced, then
/// renamed into place. An existing file at `final_path` is never replaced.
pub fn persist_container(bytes: &[u8], final_path: &Path) -> Result<PathBuf> {
    let dir = final_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(|source| Error::Destination {
        path: dir.to_path_buf(),
        source,
    })?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    debug!(tmp = %tmp.path().display(), len = bytes.len(), "container staged");

    tmp.persist_noclobber(final_path).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            Error::ContainerExists(final_path.to_path_buf())
        } else {
            Error::Io(e.error)
        }
    })?;

    Ok(final_path.to_path_buf())
}

/// Clear write permission on a container.
pub fn mark_read_only(path: &Path) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(true);
    fs::set_permissions(path, permissions)
}
