//! Cryptographic operations for clausum.
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption
//! - PBKDF2-HMAC-SHA256 passphrase-based key derivation

mod cipher;
mod kdf;

pub use cipher::{decrypt_with_key, encrypt_with_key, Cipher, CipherToken};
pub use kdf::{DerivedKey, KeyDerivation, Salt};
