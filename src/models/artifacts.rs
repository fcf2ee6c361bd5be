//! Startup artifact lifecycle.
//!
//! In encrypted mode the classifier and vectorizer files are decrypted in
//! place, deserialized, and immediately re-encrypted so plaintext only
//! exists on disk during the load window. Plaintext mode loads the files
//! directly and never touches them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use super::classifier::Classifier;
use super::spam_model::SpamModel;
use super::types::ModelError;
use super::vectorizer::TextVectorizer;
use crate::security::{ArtifactCipher, ArtifactKey, CodecError, KeyError};
use crate::telemetry::{log_security_event, SecurityEvent};

/// How artifacts are stored between process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactMode {
    /// Encrypted at rest; a key is required at startup.
    #[default]
    Encrypted,
    /// Stored as plaintext; loaded directly.
    Plaintext,
}

impl ArtifactMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactMode::Encrypted => "encrypted",
            ArtifactMode::Plaintext => "plaintext",
        }
    }
}

impl std::str::FromStr for ArtifactMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "encrypted" => Ok(ArtifactMode::Encrypted),
            "plaintext" => Ok(ArtifactMode::Plaintext),
            other => Err(format!("expected 'encrypted' or 'plaintext', got '{}'", other)),
        }
    }
}

/// Locations of the two artifact files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub vectorizer: PathBuf,
}

impl ArtifactPaths {
    pub fn new(model: impl Into<PathBuf>, vectorizer: impl Into<PathBuf>) -> Self {
        Self { model: model.into(), vectorizer: vectorizer.into() }
    }

    /// Decryption order: classifier first, then vectorizer.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [self.model.as_path(), self.vectorizer.as_path()].into_iter()
    }
}

/// Resolved artifact source, carrying the cipher when encrypted.
#[derive(Debug)]
pub enum ArtifactSource {
    Plaintext,
    Encrypted(ArtifactCipher),
}

impl ArtifactSource {
    /// Resolve the source for a mode, reading the key from `key_env` when encrypted.
    pub fn from_mode(mode: ArtifactMode, key_env: &str) -> Result<Self, StartupError> {
        match mode {
            ArtifactMode::Plaintext => Ok(ArtifactSource::Plaintext),
            ArtifactMode::Encrypted => {
                let key = ArtifactKey::from_env(key_env)?;
                Ok(ArtifactSource::Encrypted(ArtifactCipher::new(key)))
            }
        }
    }

    pub fn mode(&self) -> ArtifactMode {
        match self {
            ArtifactSource::Plaintext => ArtifactMode::Plaintext,
            ArtifactSource::Encrypted(_) => ArtifactMode::Encrypted,
        }
    }
}

/// An artifact that could not be re-encrypted and remains plaintext on disk.
#[derive(Debug)]
pub struct ResealFailure {
    pub path: PathBuf,
    pub source: CodecError,
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Encryption key unavailable: {0}")]
    Key(#[from] KeyError),

    #[error("Failed to decrypt {}: {source}", .path.display())]
    Decrypt {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("Failed to load {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("Failed to re-encrypt artifacts, plaintext left on disk: {}", describe(.0))]
    Reencrypt(Vec<ResealFailure>),

    #[error("{cause}; re-encryption also failed, plaintext left on disk: {}", describe(.failures))]
    Aborted {
        cause: Box<StartupError>,
        failures: Vec<ResealFailure>,
    },
}

fn describe(failures: &[ResealFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.path.display(), f.source))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load the serving model according to `source`.
pub fn load_model(paths: &ArtifactPaths, source: &ArtifactSource) -> Result<SpamModel, StartupError> {
    match source {
        ArtifactSource::Plaintext => {
            info!(
                model = %paths.model.display(),
                vectorizer = %paths.vectorizer.display(),
                "Loading plaintext artifacts"
            );
            read_model(paths)
        }
        ArtifactSource::Encrypted(cipher) => {
            info!(hw_accelerated = cipher.is_hw_accelerated(), "Decrypting artifacts");
            load_encrypted(paths, cipher)
        }
    }
}

/// In-place artifact transforms driven by the startup lifecycle.
pub(crate) trait ArtifactCodec {
    fn decrypt_file(&self, path: &Path) -> Result<(), CodecError>;
    fn encrypt_file(&self, path: &Path) -> Result<(), CodecError>;
}

impl ArtifactCodec for ArtifactCipher {
    fn decrypt_file(&self, path: &Path) -> Result<(), CodecError> {
        ArtifactCipher::decrypt_file(self, path)
    }

    fn encrypt_file(&self, path: &Path) -> Result<(), CodecError> {
        ArtifactCipher::encrypt_file(self, path)
    }
}

fn load_encrypted<C: ArtifactCodec>(paths: &ArtifactPaths, codec: &C) -> Result<SpamModel, StartupError> {
    let mut exposed: Vec<&Path> = Vec::with_capacity(2);

    for path in paths.iter() {
        if let Err(source) = codec.decrypt_file(path) {
            let display = path.display().to_string();
            log_security_event(
                SecurityEvent::DecryptionRejected,
                "Artifact decryption failed",
                &[("path", display.as_str())],
            );
            let cause = StartupError::Decrypt { path: path.to_path_buf(), source };
            return Err(abort(codec, &exposed, cause));
        }
        let display = path.display().to_string();
        log_security_event(
            SecurityEvent::ArtifactDecrypted,
            "Artifact decrypted",
            &[("path", display.as_str())],
        );
        exposed.push(path);
    }

    let model = match read_model(paths) {
        Ok(model) => model,
        Err(cause) => return Err(abort(codec, &exposed, cause)),
    };

    let failures = reseal(codec, &exposed);
    if !failures.is_empty() {
        return Err(StartupError::Reencrypt(failures));
    }

    info!("Artifacts loaded and re-encrypted");
    Ok(model)
}

/// Re-encrypt what was decrypted before returning `cause`.
fn abort<C: ArtifactCodec>(codec: &C, exposed: &[&Path], cause: StartupError) -> StartupError {
    let failures = reseal(codec, exposed);
    if failures.is_empty() {
        cause
    } else {
        StartupError::Aborted { cause: Box::new(cause), failures }
    }
}

/// Encrypt every path, attempting all of them even after a failure.
fn reseal<C: ArtifactCodec>(codec: &C, paths: &[&Path]) -> Vec<ResealFailure> {
    let mut failures = Vec::new();
    for path in paths {
        let display = path.display().to_string();
        match codec.encrypt_file(path) {
            Ok(()) => log_security_event(
                SecurityEvent::ArtifactResealed,
                "Artifact re-encrypted",
                &[("path", display.as_str())],
            ),
            Err(source) => {
                let reason = source.to_string();
                log_security_event(
                    SecurityEvent::PlaintextExposed,
                    "Re-encryption failed; plaintext artifact remains on disk",
                    &[("path", display.as_str()), ("reason", reason.as_str())],
                );
                failures.push(ResealFailure { path: path.to_path_buf(), source });
            }
        }
    }
    if !failures.is_empty() {
        error!(count = failures.len(), "Plaintext artifacts exposed on disk");
    }
    failures
}

fn read_model(paths: &ArtifactPaths) -> Result<SpamModel, StartupError> {
    let classifier = Classifier::from_path(&paths.model)
        .map_err(|source| StartupError::Load { path: paths.model.clone(), source })?;
    let vectorizer = TextVectorizer::from_path(&paths.vectorizer)
        .map_err(|source| StartupError::Load { path: paths.vectorizer.clone(), source })?;
    Ok(SpamModel::new(vectorizer, classifier))
}

#[cfg(test)]
#[path = "artifacts_tests.rs"]
mod tests;
