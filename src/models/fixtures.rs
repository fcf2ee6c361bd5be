//! Small fitted artifacts for unit tests.

use std::path::Path;

use super::artifacts::ArtifactPaths;
use super::classifier::{Classifier, LinearModel};
use super::types::Label;
use super::vectorizer::{TextVectorizer, VectorizerArtifact};

pub(crate) fn spam_vectorizer() -> TextVectorizer {
    TextVectorizer::new(VectorizerArtifact::counts(["free", "money", "now", "meeting", "3pm"]))
        .expect("fixture vectorizer is valid")
}

/// "FREE MONEY NOW" → 1, "meeting at 3pm" → 0.
pub(crate) fn spam_classifier() -> Classifier {
    Classifier::Linear(LinearModel {
        classes: vec![Label::Int(0), Label::Int(1)],
        coef: vec![vec![1.0, 1.0, 1.0, -1.0, -1.0]],
        intercept: vec![-0.5],
    })
}

/// Write plaintext fixture artifacts into `dir`.
pub(crate) fn write_artifacts(dir: &Path) -> ArtifactPaths {
    let paths = ArtifactPaths::new(dir.join("spam_classifier_model.json"), dir.join("vectorizer.json"));
    std::fs::write(&paths.model, spam_classifier().to_json().unwrap()).unwrap();
    std::fs::write(&paths.vectorizer, spam_vectorizer().to_json().unwrap()).unwrap();
    paths
}
