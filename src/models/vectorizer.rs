//! Fitted text vectorizer (bag-of-words / TF-IDF).
//!
//! Maps raw email text onto the fixed column schema the classifier was
//! trained against. Tokens missing from the vocabulary are ignored, so
//! every output row has exactly `n_features` columns.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::types::{FeatureMatrix, ModelError, SparseRow};

const ARTIFACT: &str = "vectorizer";

/// Default token pattern: runs of two or more word characters.
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// Row normalization applied after weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// On-disk form of a fitted vectorizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    pub vocabulary: HashMap<String, usize>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default)]
    pub strip_accents: bool,
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    /// Per-column inverse document frequency; enables TF-IDF weighting.
    #[serde(default)]
    pub idf: Option<Vec<f64>>,
    /// Row normalization. A missing key means `l2` when `idf` is set and
    /// none otherwise; an explicit `null` always means none.
    #[serde(
        default,
        deserialize_with = "explicit_norm",
        skip_serializing_if = "Option::is_none"
    )]
    pub norm: Option<Option<Norm>>,
    #[serde(default)]
    pub binary: bool,
}

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

/// Present key: `Some(value)`, including `Some(None)` for `null`.
fn explicit_norm<'de, D>(deserializer: D) -> Result<Option<Option<Norm>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Norm>::deserialize(deserializer).map(Some)
}

impl VectorizerArtifact {
    /// Plain count vectorizer over the given vocabulary, columns in order.
    pub fn counts<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(col, term)| (term.into(), col))
            .collect();
        Self {
            vocabulary,
            lowercase: true,
            strip_accents: false,
            token_pattern: default_token_pattern(),
            idf: None,
            norm: None,
            binary: false,
        }
    }

    /// Normalization actually applied to each row.
    pub fn effective_norm(&self) -> Option<Norm> {
        match self.norm {
            Some(norm) => norm,
            None if self.idf.is_some() => Some(Norm::L2),
            None => None,
        }
    }
}

/// Fitted vectorizer with its token pattern compiled.
#[derive(Debug, Clone)]
pub struct TextVectorizer {
    artifact: VectorizerArtifact,
    pattern: Regex,
    norm: Option<Norm>,
}

impl TextVectorizer {
    pub fn new(artifact: VectorizerArtifact) -> Result<Self, ModelError> {
        let n_features = artifact.vocabulary.len();

        if let Some((term, col)) = artifact.vocabulary.iter().find(|(_, col)| **col >= n_features) {
            return Err(invalid(format!(
                "term '{}' maps to column {} but vocabulary has {} columns",
                term, col, n_features
            )));
        }
        if let Some(idf) = &artifact.idf {
            if idf.len() != n_features {
                return Err(invalid(format!(
                    "idf has {} weights for {} columns",
                    idf.len(),
                    n_features
                )));
            }
        }

        let pattern = Regex::new(&artifact.token_pattern)
            .map_err(|e| invalid(format!("token_pattern does not compile: {}", e)))?;

        let norm = artifact.effective_norm();
        Ok(Self { artifact, pattern, norm })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ModelError> {
        let artifact: VectorizerArtifact = serde_json::from_slice(bytes)
            .map_err(|source| ModelError::Parse { artifact: ARTIFACT, source })?;
        Self::new(artifact)
    }

    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            artifact: ARTIFACT,
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&bytes)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.artifact)
    }

    pub fn n_features(&self) -> usize {
        self.artifact.vocabulary.len()
    }

    /// Transform documents into a feature matrix, one row per document in input order.
    pub fn transform<S: AsRef<str>>(&self, docs: &[S]) -> FeatureMatrix {
        let mut matrix = FeatureMatrix::with_capacity(self.n_features(), docs.len());
        for doc in docs {
            matrix.push_row(self.transform_one(doc.as_ref()));
        }
        matrix
    }

    fn transform_one(&self, doc: &str) -> SparseRow {
        let text = self.preprocess(doc);
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in self.pattern.find_iter(&text) {
            if let Some(&col) = self.artifact.vocabulary.get(token.as_str()) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let mut row: SparseRow = counts.into_iter().collect();
        if self.artifact.binary {
            row.iter_mut().for_each(|(_, v)| *v = 1.0);
        }
        if let Some(idf) = &self.artifact.idf {
            row.iter_mut().for_each(|(col, v)| *v *= idf[*col]);
        }
        if let Some(norm) = self.norm {
            normalize(&mut row, norm);
        }
        row
    }

    fn preprocess(&self, doc: &str) -> String {
        let text: String = if self.artifact.strip_accents {
            doc.nfkd().filter(|c| !is_combining_mark(*c)).collect()
        } else {
            doc.to_string()
        };
        if self.artifact.lowercase {
            text.to_lowercase()
        } else {
            text
        }
    }
}

fn normalize(row: &mut SparseRow, norm: Norm) {
    let total = match norm {
        Norm::L1 => row.iter().map(|(_, v)| v.abs()).sum::<f64>(),
        Norm::L2 => row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt(),
    };
    if total > 0.0 {
        row.iter_mut().for_each(|(_, v)| *v /= total);
    }
}

fn invalid(reason: String) -> ModelError {
    ModelError::Invalid { artifact: ARTIFACT, reason }
}
