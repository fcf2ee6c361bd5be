// Copyright 2024-2026 Spam-Guard Contributors
// SPDX-License-Identifier: Apache-2.0

//! Spam-Guard - spam classifier prediction service.
//!
//! Loads a fitted vectorizer and classifier from disk at startup,
//! decrypting them only for the load window when they are stored
//! encrypted at rest, and serves `POST /predict` over HTTP.

pub mod api;
pub mod config;
pub mod models;
pub mod security;
pub mod telemetry;

pub use api::{PredictionServer, ServerError};
pub use config::{ConfigError, ServiceConfig};
pub use models::{ArtifactMode, ArtifactPaths, ArtifactSource, Label, SpamModel, StartupError};
pub use security::{ArtifactCipher, ArtifactKey, CodecError, KeyError};
