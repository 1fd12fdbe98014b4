//! On-disk container format and file handling.
//!
//! ```text
//! byte[16]  salt
//! byte[*]   cipher token (nonce || ciphertext || tag, to EOF)
//! ```
//!
//! There is no magic number or version byte, so a foreign file and a corrupted
//! container look the same until decryption fails.

mod codec;
mod file;

pub use codec::{decode, encode, Container};
pub use file::{container_file_name, mark_read_only, persist_container, read_container};

use crate::config::cipher_params::{NONCE_SIZE, TAG_SIZE};
use crate::crypto::Salt;
use crate::error::Result;

/// What can be learned about a container without the passphrase.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    /// Total file size in bytes.
    pub size: usize,
    /// Key derivation salt.
    pub salt: Salt,
    /// Length of the cipher token.
    pub token_len: usize,
    /// Archive size implied by the token length.
    pub payload_len: usize,
    /// Whether the token is long enough to hold a nonce and a tag.
    pub plausible: bool,
}

/// Summarize container bytes.
pub fn inspect(bytes: &[u8]) -> Result<ContainerSummary> {
    let container = decode(bytes)?;
    let token_len = container.token.len();
    let overhead = NONCE_SIZE + TAG_SIZE;

    Ok(ContainerSummary {
        size: bytes.len(),
        salt: container.salt,
        token_len,
        payload_len: token_len.saturating_sub(overhead),
        plausible: token_len >= overhead,
    })
}
