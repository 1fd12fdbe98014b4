//! Packing a file or directory tree into an in-memory ZIP archive.

use crate::archive::{Archive, ArchiveEntry, Archiver, EntryPath, SkippedItem};
use crate::config::{Compression, SymlinkPolicy};
use crate::error::{Error, Result};
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};
use zeroize::Zeroizing;

/// One planned archive member.
struct Member {
    source: PathBuf,
    entry: EntryPath,
}

impl Archiver {
    /// Pack `source` into an archive.
    ///
    /// A file becomes one member named by its base name. A directory becomes one
    /// member per directory and regular file, named relative to the directory's
    /// parent so the top-level name is kept. `progress` receives
    /// `(members_done, members_total)`.
    pub fn pack(&self, source: &Path, progress: &mut dyn FnMut(usize, usize)) -> Result<Archive> {
        let metadata = match fs::metadata(source) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::SourceNotFound(source.to_path_buf()))
            }
            Err(e) => return Err(Error::ArchivePack(format!("{}: {}", source.display(), e))),
        };

        let root = fs::canonicalize(source)
            .map_err(|e| Error::ArchivePack(format!("{}: {}", source.display(), e)))?;
        let top_name = source
            .file_name()
            .or_else(|| root.file_name())
            .map(PathBuf::from)
            .ok_or_else(|| Error::NotFileOrDirectory(source.to_path_buf()))?;

        let mut skipped = Vec::new();
        let members = if metadata.is_file() {
            vec![Member {
                source: root.clone(),
                entry: EntryPath::from_relative(&top_name, false)?,
            }]
        } else if metadata.is_dir() {
            self.plan_directory(&root, &top_name, &mut skipped)?
        } else {
            return Err(Error::NotFileOrDirectory(source.to_path_buf()));
        };

        let method = match self.compression {
            Compression::Deflate => CompressionMethod::Deflated,
            Compression::Store => CompressionMethod::Stored,
        };
        let options = SimpleFileOptions::default().compression_method(method);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut entries = Vec::with_capacity(members.len());
        let total = members.len();

        for (idx, member) in members.into_iter().enumerate() {
            let name = member.entry.to_archive_name();
            let size = if member.entry.is_dir() {
                writer
                    .add_directory(name, options)
                    .map_err(|e| pack_error(&member.source, e))?;
                0
            } else {
                let mut file =
                    fs::File::open(&member.source).map_err(|e| pack_error(&member.source, e))?;
                writer
                    .start_file(name, options)
                    .map_err(|e| pack_error(&member.source, e))?;
                io::copy(&mut file, &mut writer).map_err(|e| pack_error(&member.source, e))?
            };

            debug!(member = %member.entry, size, "packed");
            entries.push(ArchiveEntry {
                path: member.entry,
                size,
            });
            progress(idx + 1, total);
        }

        let bytes = writer
            .finish()
            .map_err(|e| Error::ArchivePack(e.to_string()))?
            .into_inner();

        Ok(Archive {
            bytes: Zeroizing::new(bytes),
            entries,
            skipped,
        })
    }

    /// Walk a directory and decide what goes into the archive.
    fn plan_directory(
        &self,
        root: &Path,
        top_name: &Path,
        skipped: &mut Vec<SkippedItem>,
    ) -> Result<Vec<Member>> {
        let follow = self.symlinks == SymlinkPolicy::Follow;
        let mut members = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(follow)
            .sort_by_file_name()
        {
            let entry = entry?;
            let path = entry.path();
            let relative = path
                .strip_prefix(root)
                .map_err(|e| Error::ArchivePack(format!("{}: {}", path.display(), e)))?;
            let file_type = entry.file_type();

            if file_type.is_symlink() {
                warn!(path = %path.display(), "skipping symbolic link");
                skipped.push(SkippedItem {
                    path: path.to_path_buf(),
                    reason: "symbolic link",
                });
                continue;
            }

            let is_dir = file_type.is_dir();
            if !is_dir && !file_type.is_file() {
                warn!(path = %path.display(), "skipping special file");
                skipped.push(SkippedItem {
                    path: path.to_path_buf(),
                    reason: "special file",
                });
                continue;
            }

            members.push(Member {
                source: path.to_path_buf(),
                entry: EntryPath::from_relative(&top_name.join(relative), is_dir)?,
            });
        }

        Ok(members)
    }
}

fn pack_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::ArchivePack(format!("{}: {}", path.display(), e))
}
