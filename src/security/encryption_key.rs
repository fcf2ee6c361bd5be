//! Key material for artifact encryption.
//!
//! Keys travel as base64 text in an environment variable, the same shape
//! as Fernet keys. Both the URL-safe and standard alphabets are accepted,
//! padded or not.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::encryption_core::KEY_SIZE;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Encryption key variable {0} is not set")]
    Missing(String),

    #[error("Encryption key is not valid base64")]
    InvalidEncoding,

    #[error("Invalid key size: expected {expected} bytes, got {got}")]
    InvalidKeySize { expected: usize, got: usize },
}

/// 256-bit artifact key, zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ArtifactKey([u8; KEY_SIZE]);

impl ArtifactKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != KEY_SIZE {
            return Err(KeyError::InvalidKeySize {
                expected: KEY_SIZE,
                got: bytes.len(),
            });
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Parse base64 key text. Surrounding whitespace is ignored.
    pub fn from_base64(text: &str) -> Result<Self, KeyError> {
        let text = text.trim();
        let decoded = [URL_SAFE, STANDARD, URL_SAFE_NO_PAD, STANDARD_NO_PAD]
            .iter()
            .find_map(|engine| engine.decode(text).ok())
            .map(Zeroizing::new)
            .ok_or(KeyError::InvalidEncoding)?;
        Self::from_slice(&decoded)
    }

    /// Read and parse the key from the named environment variable.
    pub fn from_env(var: &str) -> Result<Self, KeyError> {
        match std::env::var(var) {
            Ok(value) => {
                let value = Zeroizing::new(value);
                Self::from_base64(&value)
            }
            Err(std::env::VarError::NotPresent) => Err(KeyError::Missing(var.to_string())),
            Err(std::env::VarError::NotUnicode(_)) => Err(KeyError::InvalidEncoding),
        }
    }

    /// Generate a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut key = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut key);
        let result = Self(key);
        key.zeroize();
        result
    }

    /// URL-safe padded base64 encoding of the key.
    pub fn to_base64(&self) -> String {
        URL_SAFE.encode(self.0)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for ArtifactKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ArtifactKey(<redacted>)")
    }
}
