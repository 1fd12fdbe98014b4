//! AES-256-GCM authenticated encryption.

use crate::config::cipher_params::{NONCE_SIZE, TAG_SIZE};
use crate::crypto::kdf::DerivedKey;
use crate::error::{Error, Result};
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use rand::RngCore;

/// Authenticated ciphertext: nonce (12 bytes) || ciphertext || tag (16 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherToken(Vec<u8>);

impl CipherToken {
    /// Wrap token bytes read back from a container.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw token bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Token length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the token is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the token and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// AES-256-GCM cipher wrapper.
pub struct Cipher {
    cipher: Aes256Gcm,
}

impl Cipher {
    /// Create a new cipher from a derived key.
    pub fn new(key: &DerivedKey) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Encrypt data under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<CipherToken> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| Error::Encryption(e.to_string()))?;

        let mut token = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&ciphertext);

        Ok(CipherToken(token))
    }

    /// Authenticate and decrypt a token produced by `encrypt`.
    ///
    /// Wrong key, truncation and tampering all return `Error::Authentication`.
    pub fn decrypt(&self, token: &CipherToken) -> Result<Vec<u8>> {
        let bytes = token.as_bytes();
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(Error::Authentication);
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| Error::Authentication)
    }
}

/// Encrypt data with a pre-derived key.
pub fn encrypt_with_key(plaintext: &[u8], key: &DerivedKey) -> Result<CipherToken> {
    Cipher::new(key).encrypt(plaintext)
}

/// Decrypt data with a pre-derived key.
pub fn decrypt_with_key(token: &CipherToken, key: &DerivedKey) -> Result<Vec<u8>> {
    Cipher::new(key).decrypt(token)
}
