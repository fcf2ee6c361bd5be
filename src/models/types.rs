//! Shared model types: labels, sparse feature matrices, and errors.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read {artifact} artifact {}: {source}", .path.display())]
    Io {
        artifact: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {artifact} artifact: {source}")]
    Parse {
        artifact: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {artifact} artifact: {reason}")]
    Invalid { artifact: &'static str, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredictError {
    #[error("Feature shape mismatch: classifier expects {expected} features, got {got}")]
    ShapeMismatch { expected: usize, got: usize },
}

/// Class label as stored in the classifier artifact.
///
/// Integer, float and string labels are accepted and are written back to
/// JSON unchanged. Whole numbers without a fraction parse as `Int`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Float(f64),
    Text(String),
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Int(v) => write!(f, "{}", v),
            Label::Float(v) => write!(f, "{}", v),
            Label::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Label {
    fn from(v: i64) -> Self {
        Label::Int(v)
    }
}

impl From<f64> for Label {
    fn from(v: f64) -> Self {
        Label::Float(v)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Text(s.to_string())
    }
}

/// One sparse row: `(column, value)` pairs sorted by column.
pub type SparseRow = Vec<(usize, f64)>;

/// Row-major sparse feature matrix with a fixed column count.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    n_features: usize,
    rows: Vec<SparseRow>,
}

impl FeatureMatrix {
    pub fn new(n_features: usize) -> Self {
        Self { n_features, rows: Vec::new() }
    }

    pub fn with_capacity(n_features: usize, n_rows: usize) -> Self {
        Self { n_features, rows: Vec::with_capacity(n_rows) }
    }

    /// Build a matrix from prepared rows, dropping entries outside the column range.
    pub fn from_rows(n_features: usize, rows: Vec<SparseRow>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().filter(|(col, _)| *col < n_features).collect())
            .collect();
        Self { n_features, rows }
    }

    pub(crate) fn push_row(&mut self, row: SparseRow) {
        debug_assert!(row.iter().all(|(col, _)| *col < self.n_features));
        self.rows.push(row);
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[SparseRow] {
        &self.rows
    }

    /// Dense copy of one row, for diagnostics and tests.
    pub fn dense_row(&self, index: usize) -> Option<Vec<f64>> {
        self.rows.get(index).map(|row| {
            let mut dense = vec![0.0; self.n_features];
            for &(col, value) in row {
                dense[col] = value;
            }
            dense
        })
    }
}
