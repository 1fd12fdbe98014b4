//! Extracting archives and checking them without extraction.

use crate::archive::{Archiver, EntryPath};
use crate::error::{Error, Result};
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

/// Name reported when the archive index itself cannot be read.
pub const ARCHIVE_INDEX: &str = "(archive index)";

/// Outcome of a successful extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackReport {
    /// Regular files written.
    pub files: usize,
    /// Directories created.
    pub directories: usize,
}

impl UnpackReport {
    /// Members fully extracted so far.
    pub fn total(&self) -> usize {
        self.files + self.directories
    }
}

/// Outcome of a successful structural check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Regular file members whose checksums matched.
    pub files: usize,
    /// Directory members.
    pub directories: usize,
}

impl Archiver {
    /// Extract archive bytes under `destination`, creating it if needed.
    ///
    /// Every member name is validated before anything is written for it. On
    /// failure, members already extracted stay on disk and their count is in
    /// the error.
    pub fn unpack(
        &self,
        bytes: &[u8],
        destination: &Path,
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<UnpackReport> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| Error::ArchiveUnpack {
            reason: format!("malformed archive: {}", e),
            extracted: 0,
        })?;

        fs::create_dir_all(destination).map_err(|source| Error::Destination {
            path: destination.to_path_buf(),
            source,
        })?;

        let total = archive.len();
        let mut report = UnpackReport::default();

        for idx in 0..total {
            let extracted = report.total();
            let mut member = archive.by_index(idx).map_err(|e| Error::ArchiveUnpack {
                reason: format!("member #{}: {}", idx, e),
                extracted,
            })?;

            let entry = EntryPath::parse(member.name()).map_err(|e| with_extracted(e, extracted))?;
            if member.enclosed_name().is_none() {
                return Err(Error::ArchiveUnpack {
                    reason: format!("unsafe member name {:?}", member.name()),
                    extracted,
                });
            }
            ensure_no_symlinks(destination, &entry, extracted)?;
            let target = entry.resolve(destination);

            if entry.is_dir() || member.is_dir() {
                io::copy(&mut member, &mut io::sink()).map_err(|e| Error::ArchiveUnpack {
                    reason: format!("{}: {}", entry, e),
                    extracted,
                })?;
                fs::create_dir_all(&target).map_err(|e| write_error(&entry, e, extracted))?;
                report.directories += 1;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| write_error(&entry, e, extracted))?;
                }
                let mut out = fs::File::create(&target).map_err(|e| write_error(&entry, e, extracted))?;
                io::copy(&mut member, &mut out).map_err(|e| write_error(&entry, e, extracted))?;
                report.files += 1;
            }

            debug!(member = %entry, "extracted");
            progress(idx + 1, total);
        }

        Ok(report)
    }
}

/// Validate every member of an archive in memory.
///
/// Each member is decompressed and its CRC-32 compared with the stored one;
/// names must pass the same checks as extraction. Nothing is written. The
/// first failing member is returned as `Error::ArchiveCorrupt`.
pub fn check(bytes: &[u8], progress: &mut dyn FnMut(usize, usize)) -> Result<CheckReport> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|_| Error::ArchiveCorrupt(ARCHIVE_INDEX.to_string()))?;
    let total = archive.len();
    let mut report = CheckReport::default();

    for idx in 0..total {
        let mut member = archive
            .by_index(idx)
            .map_err(|_| Error::ArchiveCorrupt(format!("member #{}", idx)))?;
        let name = member.name().to_string();

        let entry = EntryPath::parse(&name).map_err(|_| Error::ArchiveCorrupt(name.clone()))?;
        io::copy(&mut member, &mut io::sink()).map_err(|_| Error::ArchiveCorrupt(name.clone()))?;
        if entry.is_dir() || member.is_dir() {
            report.directories += 1;
        } else {
            report.files += 1;
        }

        progress(idx + 1, total);
    }

    Ok(report)
}

/// Refuse members whose path below `root` runs through an existing symlink.
fn ensure_no_symlinks(root: &Path, entry: &EntryPath, extracted: usize) -> Result<()> {
    let mut path = root.to_path_buf();
    for component in entry.components() {
        path.push(component);
        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(Error::ArchiveUnpack {
                    reason: format!("{} passes through symbolic link {}", entry, path.display()),
                    extracted,
                });
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(e) => return Err(write_error(entry, e, extracted)),
        }
    }
    Ok(())
}

fn with_extracted(err: Error, extracted: usize) -> Error {
    match err {
        Error::ArchiveUnpack { reason, .. } => Error::ArchiveUnpack { reason, extracted },
        other => other,
    }
}

fn write_error(entry: &EntryPath, e: io::Error, extracted: usize) -> Error {
    Error::ArchiveUnpack {
        reason: format!("{}: {}", entry, e),
        extracted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Compression, SymlinkPolicy};
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn stored() -> SimpleFileOptions {
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
    }

    fn crafted(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in members {
            writer.start_file(name.to_string(), stored()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn flip_in_payload(bytes: &mut [u8], needle: &[u8]) {
        let pos = bytes
            .windows(needle.len())
            .position(|w| w == needle)
            .expect("payload not found");
        bytes[pos] ^= 0x01;
    }

    #[test]
    fn test_roundtrip_directory() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("docs");
        fs::create_dir_all(src.join("empty")).unwrap();
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("a.txt"), b"alpha").unwrap();
        let big: Vec<u8> = (0..50_000).map(|i| (i % 251) as u8).collect();
        fs::write(src.join("sub/big.bin"), &big).unwrap();

        for compression in [Compression::Deflate, Compression::Store] {
            let archiver = Archiver::new(compression, SymlinkPolicy::Follow);
            let archive = archiver.pack(&src, &mut |_, _| {}).unwrap();
            let out = TempDir::new().unwrap();

            let report = archiver
                .unpack(archive.bytes(), out.path(), &mut |_, _| {})
                .unwrap();

            assert_eq!(report.files, 2);
            assert_eq!(report.directories, 3);
            assert_eq!(fs::read(out.path().join("docs/a.txt")).unwrap(), b"alpha");
            assert_eq!(fs::read(out.path().join("docs/sub/big.bin")).unwrap(), big);
            assert!(out.path().join("docs/empty").is_dir());
        }
    }

    #[test]
    fn test_unpack_rejects_parent_escape() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("dest");
        let bytes = crafted(&[("ok.txt", b"fine"), ("../evil.txt", b"pwned")]);

        let result = Archiver::default().unpack(&bytes, &dest, &mut |_, _| {});

        match result {
            Err(Error::ArchiveUnpack { extracted, .. }) => assert_eq!(extracted, 1),
            other => panic!("expected unpack error, got {:?}", other),
        }
        assert!(!root.path().join("evil.txt").exists());
        // Partial extraction is left in place.
        assert!(dest.join("ok.txt").exists());
    }

    #[test]
    fn test_unpack_rejects_absolute_member() {
        let root = TempDir::new().unwrap();
        let target = root.path().join("abs.txt");
        let name = target.to_string_lossy().to_string();
        let bytes = crafted(&[(&name, b"pwned")]);

        let result = Archiver::default().unpack(&bytes, &root.path().join("dest"), &mut |_, _| {});

        assert!(matches!(result, Err(Error::ArchiveUnpack { extracted: 0, .. })));
        assert!(!target.exists());
    }

    #[test]
    fn test_unpack_malformed_bytes() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("dest");

        let result = Archiver::default().unpack(b"definitely not a zip", &dest, &mut |_, _| {});

        assert!(matches!(result, Err(Error::ArchiveUnpack { .. })));
        assert!(!dest.exists());
    }

    #[test]
    fn test_unpack_detects_checksum_mismatch() {
        let dir = TempDir::new().unwrap();
        let mut bytes = crafted(&[("a.txt", b"first-member"), ("b.txt", b"second-member")]);
        flip_in_payload(&mut bytes, b"second-member");

        let result = Archiver::default().unpack(&bytes, dir.path(), &mut |_, _| {});
        assert!(matches!(result, Err(Error::ArchiveUnpack { extracted: 1, .. })));
    }

    #[test]
    fn test_check_names_first_bad_member() {
        let mut bytes = crafted(&[
            ("a.txt", b"first-member"),
            ("b.txt", b"second-member"),
            ("c.txt", b"third-member"),
        ]);
        flip_in_payload(&mut bytes, b"second-member");
        flip_in_payload(&mut bytes, b"third-member");

        match check(&bytes, &mut |_, _| {}) {
            Err(Error::ArchiveCorrupt(name)) => assert_eq!(name, "b.txt"),
            other => panic!("expected corrupt archive, got {:?}", other),
        }
    }

    #[test]
    fn test_check_intact_archive() {
        let bytes = crafted(&[("a.txt", b"one"), ("b.txt", b"two")]);
        let mut calls = 0;

        let report = check(&bytes, &mut |_, _| calls += 1).unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_check_rejects_unsafe_names() {
        let bytes = crafted(&[("../evil.txt", b"x")]);
        assert!(matches!(
            check(&bytes, &mut |_, _| {}),
            Err(Error::ArchiveCorrupt(name)) if name == "../evil.txt"
        ));
    }

    #[test]
    fn test_check_reads_directory_payloads() {
        let mut bytes = crafted(&[("d/", b"hidden-payload"), ("d/a.txt", b"alpha")]);
        flip_in_payload(&mut bytes, b"hidden-payload");

        match check(&bytes, &mut |_, _| {}) {
            Err(Error::ArchiveCorrupt(name)) => assert_eq!(name, "d/"),
            other => panic!("expected corrupt archive, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unpack_refuses_symlinked_parent() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("dest");
        let outside = root.path().join("outside");
        fs::create_dir_all(&dest).unwrap();
        fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, dest.join("docs")).unwrap();
        let bytes = crafted(&[("docs/a.txt", b"alpha")]);

        let result = Archiver::default().unpack(&bytes, &dest, &mut |_, _| {});

        assert!(matches!(result, Err(Error::ArchiveUnpack { extracted: 0, .. })));
        assert!(!outside.join("a.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_unpack_refuses_symlinked_file() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("dest");
        let victim = root.path().join("victim.txt");
        fs::create_dir_all(&dest).unwrap();
        fs::write(&victim, b"original").unwrap();
        std::os::unix::fs::symlink(&victim, dest.join("a.txt")).unwrap();
        let bytes = crafted(&[("a.txt", b"overwritten")]);

        let result = Archiver::default().unpack(&bytes, &dest, &mut |_, _| {});

        assert!(matches!(result, Err(Error::ArchiveUnpack { .. })));
        assert_eq!(fs::read(&victim).unwrap(), b"original");
    }

    #[test]
    fn test_check_garbage() {
        assert!(matches!(
            check(b"garbage", &mut |_, _| {}),
            Err(Error::ArchiveCorrupt(name)) if name == ARCHIVE_INDEX
        ));
    }
}
