//! PBKDF2-HMAC-SHA256 key derivation for passphrase-based encryption.

use crate::config::kdf_params;
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Per-container random salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; kdf_params::SALT_LENGTH]);

impl Salt {
    /// Generate a fresh salt from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut salt = [0u8; kdf_params::SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        Self(salt)
    }

    /// Wrap existing salt bytes (read back from a container).
    pub fn from_bytes(bytes: [u8; kdf_params::SALT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw salt bytes.
    pub fn as_bytes(&self) -> &[u8; kdf_params::SALT_LENGTH] {
        &self.0
    }
}

/// A 256-bit key bound to one (passphrase, salt, work factor) triple.
///
/// Wiped from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; kdf_params::OUTPUT_LENGTH]);

impl DerivedKey {
    /// Wrap raw key material.
    pub fn from_bytes(bytes: [u8; kdf_params::OUTPUT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; kdf_params::OUTPUT_LENGTH] {
        &self.0
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for DerivedKey {}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Key derivation using PBKDF2 with HMAC-SHA256.
#[derive(Debug, Clone, Copy)]
pub struct KeyDerivation {
    work_factor: u32,
}

impl KeyDerivation {
    /// Create a KDF with the given iteration count.
    pub fn new(work_factor: u32) -> Self {
        Self { work_factor }
    }

    /// Iteration count used by this KDF.
    pub fn work_factor(&self) -> u32 {
        self.work_factor
    }

    /// Derive a 256-bit key from a passphrase and salt.
    ///
    /// Deterministic in its inputs. Does not judge passphrase quality; callers
    /// enforce their own minimum length before calling.
    pub fn derive(&self, passphrase: &str, salt: &Salt) -> DerivedKey {
        let mut key = [0u8; kdf_params::OUTPUT_LENGTH];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            passphrase.as_bytes(),
            salt.as_bytes(),
            self.work_factor,
            &mut key,
        );
        let derived = DerivedKey(key);
        key.zeroize();
        derived
    }
}

impl Default for KeyDerivation {
    fn default() -> Self {
        Self::new(kdf_params::DEFAULT_ITERATIONS)
    }
}
