//! Service configuration.
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! `SPAM_GUARD_*` environment overrides. The encryption key is read
//! separately at startup and never stored here.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ArtifactMode, ArtifactPaths};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_FILE_ENV: &str = "SPAM_GUARD_CONFIG";
/// Default environment variable holding the base64 artifact key.
pub const DEFAULT_KEY_ENV: &str = "SPAM_GUARD_KEY";

const ENV_BIND: &str = "SPAM_GUARD_BIND";
const ENV_MODEL_PATH: &str = "SPAM_GUARD_MODEL_PATH";
const ENV_VECTORIZER_PATH: &str = "SPAM_GUARD_VECTORIZER_PATH";
const ENV_ARTIFACT_MODE: &str = "SPAM_GUARD_ARTIFACT_MODE";
const ENV_KEY_ENV: &str = "SPAM_GUARD_KEY_ENV";
const ENV_MAX_BODY_BYTES: &str = "SPAM_GUARD_MAX_BODY_BYTES";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Prediction service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// HTTP listener address.
    pub bind_addr: SocketAddr,
    /// Serialized classifier, relative to the working directory.
    pub model_path: PathBuf,
    /// Serialized vectorizer, relative to the working directory.
    pub vectorizer_path: PathBuf,
    pub artifact_mode: ArtifactMode,
    /// Name of the environment variable carrying the key (encrypted mode).
    pub key_env: String,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            model_path: PathBuf::from("spam_classifier_model.json"),
            vectorizer_path: PathBuf::from("vectorizer.json"),
            artifact_mode: ArtifactMode::Encrypted,
            key_env: DEFAULT_KEY_ENV.to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl ServiceConfig {
    /// Load from `SPAM_GUARD_CONFIG` (if set) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from);
        Self::load_from(file.as_deref())
    }

    /// Load from an explicit file (if any) and the process environment.
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_BIND) {
            self.bind_addr = v.trim().parse().map_err(|e| ConfigError::InvalidEnv {
                var: ENV_BIND,
                reason: format!("{}", e),
            })?;
        }
        if let Some(v) = lookup(ENV_MODEL_PATH) {
            self.model_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_VECTORIZER_PATH) {
            self.vectorizer_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_ARTIFACT_MODE) {
            self.artifact_mode = v
                .parse()
                .map_err(|reason| ConfigError::InvalidEnv { var: ENV_ARTIFACT_MODE, reason })?;
        }
        if let Some(v) = lookup(ENV_KEY_ENV) {
            self.key_env = v.trim().to_string();
        }
        if let Some(v) = lookup(ENV_MAX_BODY_BYTES) {
            self.max_body_bytes = v.trim().parse().map_err(|e| ConfigError::InvalidEnv {
                var: ENV_MAX_BODY_BYTES,
                reason: format!("{}", e),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_path(&self.model_path, "model_path")?;
        validate_path(&self.vectorizer_path, "vectorizer_path")?;

        if self.model_path == self.vectorizer_path {
            return Err(ConfigError::Invalid(
                "model_path and vectorizer_path must differ".to_string(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("max_body_bytes must be > 0".to_string()));
        }
        if self.artifact_mode == ArtifactMode::Encrypted && self.key_env.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "key_env must name a variable in encrypted mode".to_string(),
            ));
        }
        Ok(())
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.model_path, &self.vectorizer_path)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn validate_path(path: &Path, field: &str) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.is_empty() {
        return Err(ConfigError::Invalid(format!("{} cannot be empty", field)));
    }
    if text.contains('\0') {
        return Err(ConfigError::Invalid(format!("{} contains null byte", field)));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
