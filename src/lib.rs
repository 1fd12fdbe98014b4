//! clausum: passphrase-encrypted backup containers
//!
//! Packs a file or directory into a single archive, encrypts it under a key
//! derived from a passphrase and writes one self-contained container file. The
//! container can later be restored to disk, or verified (passphrase and
//! contents) without writing anything.
//!
//! # Features
//!
//! - **AES-256-GCM Encryption**: Authenticated encryption with PBKDF2-HMAC-SHA256 key derivation
//! - **ZIP Archives**: Deflate-compressed members with per-member CRC-32 checks
//! - **Safe Extraction**: Member names are validated so nothing lands outside the restore root
//! - **Progress Events**: Immutable events pushed through a channel
//! - **CLI Interface**: `create`, `restore`, `verify`, `strength`, `inspect`
//!
//! # Architecture
//!
//! ```text
//! Path → Pack (ZIP) → Derive key (PBKDF2) → Encrypt (AES-256-GCM) → salt || token
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use clausum::{Backup, BackupConfig, NoProgress};
//! use std::path::Path;
//!
//! let backup = Backup::new(BackupConfig::default()).unwrap();
//!
//! let report = backup
//!     .create(
//!         Path::new("./photos"),
//!         Path::new("./backups"),
//!         "photos",
//!         "CorrectHorseBattery1!",
//!         &NoProgress,
//!     )
//!     .unwrap();
//!
//! let outcome = backup
//!     .verify(&report.container, "CorrectHorseBattery1!", &NoProgress)
//!     .unwrap();
//! assert!(outcome.is_ok());
//! ```

pub mod archive;
pub mod backup;
pub mod config;
pub mod container;
pub mod crypto;
pub mod error;
pub mod progress;
pub mod strength;
pub mod verify;

pub use backup::{Backup, CreateReport, RestoreReport};
pub use config::BackupConfig;
pub use error::{Error, ErrorKind, Result};
pub use progress::{NoProgress, Phase, ProgressEvent, ProgressSink};
pub use verify::VerifyOutcome;
