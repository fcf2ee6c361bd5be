//! Vectorizer and classifier paired for serving.

use tracing::warn;

use super::classifier::Classifier;
use super::types::{Label, PredictError};
use super::vectorizer::TextVectorizer;

/// Immutable prediction pipeline: text → features → labels.
///
/// Shared read-only across request handlers after startup.
#[derive(Debug, Clone)]
pub struct SpamModel {
    vectorizer: TextVectorizer,
    classifier: Classifier,
}

impl SpamModel {
    /// Pair a vectorizer with a classifier.
    ///
    /// The two must have been fitted together. A column-count mismatch is
    /// reported here as a warning; requests then fail individually.
    pub fn new(vectorizer: TextVectorizer, classifier: Classifier) -> Self {
        if vectorizer.n_features() != classifier.n_features() {
            warn!(
                vectorizer_features = vectorizer.n_features(),
                classifier_features = classifier.n_features(),
                "Vectorizer and classifier feature schemas differ; predictions will fail"
            );
        }
        Self { vectorizer, classifier }
    }

    /// One label per email, in input order.
    pub fn predict<S: AsRef<str>>(&self, emails: &[S]) -> Result<Vec<Label>, PredictError> {
        let features = self.vectorizer.transform(emails);
        self.classifier.predict(&features)
    }

    pub fn classes(&self) -> &[Label] {
        self.classifier.classes()
    }

    pub fn n_features(&self) -> usize {
        self.vectorizer.n_features()
    }

    pub fn vectorizer(&self) -> &TextVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }
}
