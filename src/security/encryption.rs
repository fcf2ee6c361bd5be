//! Artifact Encryption Module
//!
//! Provides AES-256-GCM encryption for model artifacts at rest.
//! Split into sub-modules:
//! - `encryption_core`: Cipher and in-place file transforms
//! - `encryption_io`: Container framing and atomic file writes
//! - `encryption_key`: Key parsing and generation

pub use super::encryption_core::*;
pub use super::encryption_io::{is_sealed_file, HEADER_SIZE, MAGIC};
pub use super::encryption_key::{ArtifactKey, KeyError};

#[cfg(test)]
#[path = "encryption_tests.rs"]
mod tests;
