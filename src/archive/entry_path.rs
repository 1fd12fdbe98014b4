//! Archive member names.
//!
//! Every name read from an archive goes through [`EntryPath::parse`] before
//! anything is written for it, regardless of who produced the archive.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// A validated, relative archive member path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryPath {
    components: Vec<String>,
    is_dir: bool,
}

impl EntryPath {
    /// Parse a member name as stored in the archive (`/`-separated).
    ///
    /// A trailing `/` marks a directory. Rejects absolute names, `.` and `..`
    /// components, backslashes, NUL bytes and drive prefixes.
    pub fn parse(name: &str) -> Result<Self> {
        if name.starts_with('/') {
            return Err(invalid(name, "absolute path"));
        }
        if name.contains('\\') {
            return Err(invalid(name, "backslash in name"));
        }
        if name.contains('\0') {
            return Err(invalid(name, "NUL in name"));
        }

        let is_dir = name.ends_with('/');
        let components: Vec<String> = name
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();

        if components.is_empty() {
            return Err(invalid(name, "empty name"));
        }

        for component in &components {
            if component == "." || component == ".." {
                return Err(invalid(name, "relative component"));
            }
        }

        if let Some(first) = components.first() {
            let bytes = first.as_bytes();
            if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
                return Err(invalid(name, "drive prefix"));
            }
        }

        Ok(Self { components, is_dir })
    }

    /// Build a member path from a filesystem path relative to the pack root.
    pub fn from_relative(path: &Path, is_dir: bool) -> Result<Self> {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        Error::ArchivePack(format!(
                            "file name is not valid UTF-8: {}",
                            path.display()
                        ))
                    })?;
                    components.push(part.to_string());
                }
                Component::CurDir => {}
                _ => {
                    return Err(Error::ArchivePack(format!(
                        "path leaves the source root: {}",
                        path.display()
                    )))
                }
            }
        }

        if components.is_empty() {
            return Err(Error::ArchivePack(format!(
                "empty member path: {}",
                path.display()
            )));
        }

        Ok(Self { components, is_dir })
    }

    /// Path components.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Whether this names a directory.
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// The last component.
    pub fn name(&self) -> &str {
        self.components.last().map(|s| s.as_str()).unwrap_or("")
    }

    /// Name as written into the archive.
    pub fn to_archive_name(&self) -> String {
        let joined = self.components.join("/");
        if self.is_dir {
            format!("{}/", joined)
        } else {
            joined
        }
    }

    /// Resolve under an extraction root. Never leaves `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for component in &self.components {
            path.push(component);
        }
        path
    }
}

impl std::fmt::Display for EntryPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_archive_name())
    }
}

fn invalid(name: &str, why: &str) -> Error {
    Error::ArchiveUnpack {
        reason: format!("unsafe member name {:?}: {}", name, why),
        extracted: 0,
    }
}
