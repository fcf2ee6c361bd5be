//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::Path;

use spam_guard::models::{Classifier, LinearModel, TextVectorizer, VectorizerArtifact};
use spam_guard::{ArtifactMode, ArtifactPaths, Label, ServiceConfig};

/// Count vectorizer and linear model where "FREE MONEY NOW" is spam (1)
/// and "meeting at 3pm" is ham (0).
pub fn write_spam_artifacts(dir: &Path) -> ArtifactPaths {
    let vectorizer =
        TextVectorizer::new(VectorizerArtifact::counts(["free", "money", "now", "meeting", "3pm"]))
            .unwrap();
    let classifier = Classifier::Linear(LinearModel {
        classes: vec![Label::Int(0), Label::Int(1)],
        coef: vec![vec![1.0, 1.0, 1.0, -1.0, -1.0]],
        intercept: vec![-0.5],
    });

    let paths = ArtifactPaths::new(dir.join("spam_classifier_model.json"), dir.join("vectorizer.json"));
    std::fs::write(&paths.model, classifier.to_json().unwrap()).unwrap();
    std::fs::write(&paths.vectorizer, vectorizer.to_json().unwrap()).unwrap();
    paths
}

pub fn config_for(paths: &ArtifactPaths, mode: ArtifactMode, key_env: &str) -> ServiceConfig {
    ServiceConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        model_path: paths.model.clone(),
        vectorizer_path: paths.vectorizer.clone(),
        artifact_mode: mode,
        key_env: key_env.to_string(),
        ..Default::default()
    }
}
