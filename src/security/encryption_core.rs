//! Whole-artifact AES-256-GCM.
//!
//! One container per file: the nonce travels in the header, the tag at the
//! end of the ciphertext. AES-NI is used when the CPU has it.
//!
//! Every encryption draws a fresh nonce from the OS CSPRNG. Key material and
//! decrypted plaintext buffers are zeroed on drop.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zeroize::Zeroizing;

use super::encryption_io;
use super::encryption_key::ArtifactKey;

/// Encryption key size (256 bits)
pub const KEY_SIZE: usize = 32;
/// Nonce size (96 bits for GCM)
pub const NONCE_SIZE: usize = 12;
/// Tag size (128 bits)
pub const TAG_SIZE: usize = 16;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    #[error("Unsupported container version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("Authentication failed (wrong key or tampered artifact)")]
    AuthenticationFailed,

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodecError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        CodecError::Io { path: path.to_path_buf(), source }
    }
}

/// Whole-artifact cipher using AES-256-GCM.
///
/// Stateless apart from the key: every call is independent and the
/// ciphertext container carries its own nonce.
pub struct ArtifactCipher {
    key: ArtifactKey,
    hw_accelerated: bool,
}

impl ArtifactCipher {
    /// Create a new cipher with the given key
    pub fn new(key: ArtifactKey) -> Self {
        #[cfg(target_arch = "x86_64")]
        let hw_accelerated = is_x86_feature_detected!("aes");
        #[cfg(not(target_arch = "x86_64"))]
        let hw_accelerated = false;

        Self { key, hw_accelerated }
    }

    /// Encrypt a buffer into a self-contained container (header, nonce, ciphertext with tag).
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
        let cipher = self.cipher();
        let nonce_bytes = Self::generate_nonce();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CodecError::EncryptionFailed(e.to_string()))?;

        Ok(encryption_io::seal_container(&nonce_bytes, &ciphertext))
    }

    /// Decrypt a container produced by [`ArtifactCipher::encrypt_bytes`].
    pub fn decrypt_bytes(&self, sealed: &[u8]) -> Result<Vec<u8>, CodecError> {
        let (nonce_bytes, ciphertext) = encryption_io::open_container(sealed)?;
        let nonce = Nonce::from_slice(&nonce_bytes);
        self.cipher()
            .decrypt(nonce, ciphertext)
            .map_err(|_| CodecError::AuthenticationFailed)
    }

    /// Encrypt a file in place.
    pub fn encrypt_file(&self, path: &Path) -> Result<(), CodecError> {
        let plaintext = Zeroizing::new(encryption_io::read_file_bytes(path)?);
        let sealed = self.encrypt_bytes(&plaintext)?;
        encryption_io::overwrite_file(path, &sealed)
    }

    /// Decrypt a file in place.
    ///
    /// The file is left untouched when authentication fails.
    pub fn decrypt_file(&self, path: &Path) -> Result<(), CodecError> {
        let sealed = encryption_io::read_file_bytes(path)?;
        let plaintext = Zeroizing::new(self.decrypt_bytes(&sealed)?);
        encryption_io::overwrite_file(path, &plaintext)
    }

    /// Check if hardware acceleration is available
    pub fn is_hw_accelerated(&self) -> bool {
        self.hw_accelerated
    }

    fn cipher(&self) -> Aes256Gcm {
        let key = aes_gcm::Key::<Aes256Gcm>::from_slice(self.key.as_bytes());
        Aes256Gcm::new(key)
    }

    fn generate_nonce() -> [u8; NONCE_SIZE] {
        use rand::RngCore;
        let mut nonce = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce[..]);
        nonce
    }
}

impl std::fmt::Debug for ArtifactCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactCipher")
            .field("key", &self.key)
            .field("hw_accelerated", &self.hw_accelerated)
            .finish()
    }
}
