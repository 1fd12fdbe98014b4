//! Configuration constants and types for clausum.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File extension given to containers.
pub const CONTAINER_EXTENSION: &str = "enc";

/// Suffix appended to the container stem to name the restore directory.
pub const RESTORED_SUFFIX: &str = "_restored";

/// Minimum passphrase length the front end requires for new containers.
pub const MIN_PASSPHRASE_LEN: usize = 12;

/// PBKDF2 parameters for key derivation.
pub mod kdf_params {
    /// Default iteration count for PBKDF2-HMAC-SHA256.
    pub const DEFAULT_ITERATIONS: u32 = 600_000;

    /// Output length in bytes (256 bits).
    pub const OUTPUT_LENGTH: usize = 32;

    /// Salt length in bytes.
    pub const SALT_LENGTH: usize = 16;
}

/// AES-GCM framing parameters.
pub mod cipher_params {
    /// Nonce size (96 bits).
    pub const NONCE_SIZE: usize = 12;

    /// Authentication tag size (128 bits).
    pub const TAG_SIZE: usize = 16;
}

/// How archive members are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Deflate every member.
    #[default]
    Deflate,
    /// Store members uncompressed.
    Store,
}

/// What the archiver does with symbolic links found under the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymlinkPolicy {
    /// Resolve links and archive the content they point to.
    #[default]
    Follow,
    /// Leave links out and record them as skipped.
    Skip,
}

/// Configuration for backup operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// PBKDF2 iteration count.
    ///
    /// Not stored in the container: restoring needs the value used to create it.
    pub work_factor: u32,

    /// Archive member compression.
    pub compression: Compression,

    /// Symlink handling while packing.
    pub symlinks: SymlinkPolicy,

    /// Mark a freshly written container read-only (best effort).
    pub read_only: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            work_factor: kdf_params::DEFAULT_ITERATIONS,
            compression: Compression::default(),
            symlinks: SymlinkPolicy::default(),
            read_only: true,
        }
    }
}

impl BackupConfig {
    /// Load a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Return a copy with a different work factor.
    pub fn with_work_factor(mut self, work_factor: u32) -> Self {
        self.work_factor = work_factor;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.work_factor == 0 {
            return Err(Error::InvalidConfig(
                "work factor must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
