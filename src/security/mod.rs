// Copyright 2024-2026 Spam-Guard Contributors
// SPDX-License-Identifier: Apache-2.0

//! Security primitives for artifacts at rest.

pub mod encryption;
mod encryption_core;
mod encryption_io;
mod encryption_key;

pub use encryption::{ArtifactCipher, ArtifactKey, CodecError, KeyError};
