//! Fitted model artifacts and their startup lifecycle.

pub mod artifacts;
pub mod classifier;
pub mod spam_model;
pub mod types;
pub mod vectorizer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use artifacts::{load_model, ArtifactMode, ArtifactPaths, ArtifactSource, ResealFailure, StartupError};
pub use classifier::{Classifier, LinearModel, MultinomialNb};
pub use spam_model::SpamModel;
pub use types::{FeatureMatrix, Label, ModelError, PredictError, SparseRow};
pub use vectorizer::{Norm, TextVectorizer, VectorizerArtifact};
