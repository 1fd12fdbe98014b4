//! Container layout: `salt (16 bytes) || cipher token (to end)`.

use crate::config::kdf_params::SALT_LENGTH;
use crate::crypto::{CipherToken, Salt};
use crate::error::{Error, Result};

/// A decoded container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// Key derivation salt, stored in clear.
    pub salt: Salt,
    /// Authenticated ciphertext of the archive.
    pub token: CipherToken,
}

impl Container {
    /// Assemble a container.
    pub fn new(salt: Salt, token: CipherToken) -> Self {
        Self { salt, token }
    }

    /// Serialize to the on-disk layout.
    pub fn encode(&self) -> Vec<u8> {
        encode(&self.salt, &self.token)
    }

    /// Parse the on-disk layout.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode(bytes)
    }

    /// Total encoded size in bytes.
    pub fn size(&self) -> usize {
        SALT_LENGTH + self.token.len()
    }
}

/// Concatenate salt and token.
pub fn encode(salt: &Salt, token: &CipherToken) -> Vec<u8> {
    let mut out = Vec::with_capacity(SALT_LENGTH + token.len());
    out.extend_from_slice(salt.as_bytes());
    out.extend_from_slice(token.as_bytes());
    out
}

/// Split container bytes into salt and token.
///
/// Only the length is checked here; whether the token is genuine is decided by
/// authenticated decryption.
pub fn decode(bytes: &[u8]) -> Result<Container> {
    if bytes.len() < SALT_LENGTH {
        return Err(Error::ContainerFormat {
            len: bytes.len(),
            expected: SALT_LENGTH,
        });
    }

    let (salt_bytes, token_bytes) = bytes.split_at(SALT_LENGTH);
    let mut salt = [0u8; SALT_LENGTH];
    salt.copy_from_slice(salt_bytes);

    Ok(Container {
        salt: Salt::from_bytes(salt),
        token: CipherToken::from_bytes(token_bytes.to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_plain_concatenation() {
        let salt = Salt::from_bytes([0xAB; 16]);
        let token = CipherToken::from_bytes(vec![1, 2, 3, 4]);

        let bytes = encode(&salt, &token);
        assert_eq!(&bytes[..16], &[0xAB; 16]);
        assert_eq!(&bytes[16..], &[1, 2, 3, 4]);

        let container = decode(&bytes).unwrap();
        assert_eq!(container.salt, salt);
        assert_eq!(container.token, token);
        assert_eq!(container.size(), 20);
    }

    #[test]
    fn test_exactly_salt_length_gives_empty_token() {
        let container = decode(&[5u8; 16]).unwrap();
        assert!(container.token.is_empty());
    }

    #[test]
    fn test_short_input_rejected() {
        let result = decode(&[0u8; 15]);
        assert!(matches!(
            result,
            Err(Error::ContainerFormat {
                len: 15,
                expected: 16
            })
        ));
        assert!(decode(&[]).is_err());
    }
}
