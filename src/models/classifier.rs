//! Fitted classifiers.
//!
//! Two model families cover the usual spam classifiers:
//! - `linear`: logistic regression / linear SVM decision functions
//! - `multinomial_nb`: multinomial naive Bayes over term counts

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::{FeatureMatrix, Label, ModelError, PredictError, SparseRow};

const ARTIFACT: &str = "classifier";

/// Linear decision function per class.
///
/// With two classes and one coefficient row the sign of the decision picks
/// `classes[1]` (positive) or `classes[0]`. Otherwise there is one row per
/// class and the highest score wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub classes: Vec<Label>,
    /// Coefficients `[n_rows][n_features]`
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

/// Multinomial naive Bayes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    pub classes: Vec<Label>,
    pub class_log_prior: Vec<f64>,
    /// Log probabilities `[n_classes][n_features]`
    pub feature_log_prob: Vec<Vec<f64>>,
}

/// Classifier artifact, tagged by `"kind"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    Linear(LinearModel),
    MultinomialNb(MultinomialNb),
}

impl Classifier {
    pub fn from_json(bytes: &[u8]) -> Result<Self, ModelError> {
        let classifier: Classifier = serde_json::from_slice(bytes)
            .map_err(|source| ModelError::Parse { artifact: ARTIFACT, source })?;
        classifier.validate()?;
        Ok(classifier)
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
        serde_json::to_vec(self)
    }

    /// Check internal consistency of the fitted parameters.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Classifier::Linear(m) => {
                if m.classes.is_empty() {
                    return Err(invalid("no classes".into()));
                }
                let binary = m.coef.len() == 1 && m.classes.len() == 2;
                if !binary && m.coef.len() != m.classes.len() {
                    return Err(invalid(format!(
                        "{} coefficient rows for {} classes",
                        m.coef.len(),
                        m.classes.len()
                    )));
                }
                if m.intercept.len() != m.coef.len() {
                    return Err(invalid(format!(
                        "{} intercepts for {} coefficient rows",
                        m.intercept.len(),
                        m.coef.len()
                    )));
                }
                check_rectangular(&m.coef, "coef")
            }
            Classifier::MultinomialNb(m) => {
                if m.classes.is_empty() {
                    return Err(invalid("no classes".into()));
                }
                if m.class_log_prior.len() != m.classes.len()
                    || m.feature_log_prob.len() != m.classes.len()
                {
                    return Err(invalid(format!(
                        "{} classes, {} priors, {} likelihood rows",
                        m.classes.len(),
                        m.class_log_prior.len(),
                        m.feature_log_prob.len()
                    )));
                }
                check_rectangular(&m.feature_log_prob, "feature_log_prob")
            }
        }
    }

    pub fn classes(&self) -> &[Label] {
        match self {
            Classifier::Linear(m) => &m.classes,
            Classifier::MultinomialNb(m) => &m.classes,
        }
    }

    /// Number of input columns the classifier was fitted on.
    pub fn n_features(&self) -> usize {
        let rows = match self {
            Classifier::Linear(m) => &m.coef,
            Classifier::MultinomialNb(m) => &m.feature_log_prob,
        };
        rows.first().map_or(0, Vec::len)
    }

    /// Predict one label per matrix row, in row order.
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<Label>, PredictError> {
        if x.n_features() != self.n_features() {
            return Err(PredictError::ShapeMismatch {
                expected: self.n_features(),
                got: x.n_features(),
            });
        }
        Ok(x.rows().iter().map(|row| self.predict_row(row).clone()).collect())
    }

    fn predict_row(&self, row: &SparseRow) -> &Label {
        match self {
            Classifier::Linear(m) if m.coef.len() == 1 && m.classes.len() == 2 => {
                let score = dot(&m.coef[0], row) + m.intercept[0];
                if score > 0.0 {
                    &m.classes[1]
                } else {
                    &m.classes[0]
                }
            }
            Classifier::Linear(m) => {
                let scores = m.coef.iter().zip(&m.intercept).map(|(w, b)| dot(w, row) + b);
                &m.classes[argmax(scores)]
            }
            Classifier::MultinomialNb(m) => {
                let scores = m
                    .feature_log_prob
                    .iter()
                    .zip(&m.class_log_prior)
                    .map(|(w, prior)| dot(w, row) + prior);
                &m.classes[argmax(scores)]
            }
        }
    }
}

fn dot(weights: &[f64], row: &SparseRow) -> f64 {
    row.iter().map(|&(col, v)| weights[col] * v).sum()
}

/// Index of the first maximum.
fn argmax(scores: impl Iterator<Item = f64>) -> usize {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, score) in scores.enumerate() {
        if score > best.1 {
            best = (i, score);
        }
    }
    best.0
}

fn check_rectangular(rows: &[Vec<f64>], field: &str) -> Result<(), ModelError> {
    let width = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(invalid(format!(
            "{} row {} has {} columns, expected {}",
            field,
            i,
            row.len(),
            width
        )));
    }
    Ok(())
}

fn invalid(reason: String) -> ModelError {
    ModelError::Invalid { artifact: ARTIFACT, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_linear() -> Classifier {
        Classifier::Linear(LinearModel {
            classes: vec![Label::Int(0), Label::Int(1)],
            coef: vec![vec![2.0, -1.5, 0.5]],
            intercept: vec![-0.5],
        })
    }

    fn matrix(rows: Vec<SparseRow>) -> FeatureMatrix {
        FeatureMatrix::from_rows(3, rows)
    }

    #[test]
    fn binary_linear_uses_decision_sign() {
        let clf = binary_linear();
        let x = matrix(vec![vec![(0, 1.0)], vec![(1, 1.0)], vec![]]);
        let labels = clf.predict(&x).unwrap();
        assert_eq!(labels, vec![Label::Int(1), Label::Int(0), Label::Int(0)]);
    }

    #[test]
    fn zero_decision_picks_negative_class() {
        let clf = Classifier::Linear(LinearModel {
            classes: vec!["ham".into(), "spam".into()],
            coef: vec![vec![0.0, 0.0, 0.0]],
            intercept: vec![0.0],
        });
        let labels = clf.predict(&matrix(vec![vec![(2, 4.0)]])).unwrap();
        assert_eq!(labels, vec![Label::from("ham")]);
    }

    #[test]
    fn multiclass_linear_argmax() {
        let clf = Classifier::Linear(LinearModel {
            classes: vec!["ham".into(), "spam".into(), "phish".into()],
            coef: vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]],
            intercept: vec![0.0, 0.0, 0.0],
        });
        let x = matrix(vec![vec![(2, 3.0)], vec![(1, 1.0), (0, 0.5)], vec![]]);
        let labels = clf.predict(&x).unwrap();
        // Ties resolve to the first class.
        assert_eq!(
            labels,
            vec![Label::from("phish"), Label::from("spam"), Label::from("ham")]
        );
    }

    #[test]
    fn naive_bayes_prefers_likelier_class() {
        let clf = Classifier::MultinomialNb(MultinomialNb {
            classes: vec![Label::Int(0), Label::Int(1)],
            class_log_prior: vec![(0.6f64).ln(), (0.4f64).ln()],
            feature_log_prob: vec![
                vec![(0.1f64).ln(), (0.1f64).ln(), (0.8f64).ln()],
                vec![(0.45f64).ln(), (0.45f64).ln(), (0.1f64).ln()],
            ],
        });
        let x = matrix(vec![vec![(0, 2.0), (1, 1.0)], vec![(2, 3.0)], vec![]]);
        let labels = clf.predict(&x).unwrap();
        assert_eq!(labels, vec![Label::Int(1), Label::Int(0), Label::Int(0)]);
    }

    #[test]
    fn shape_mismatch_is_error() {
        let clf = binary_linear();
        let x = FeatureMatrix::from_rows(5, vec![vec![(4, 1.0)]]);
        assert_eq!(
            clf.predict(&x).unwrap_err(),
            PredictError::ShapeMismatch { expected: 3, got: 5 }
        );
    }

    #[test]
    fn empty_matrix_predicts_nothing() {
        let clf = binary_linear();
        assert!(clf.predict(&FeatureMatrix::new(3)).unwrap().is_empty());
    }

    #[test]
    fn json_tagged_by_kind() {
        let json = br#"{"kind":"linear","classes":[0,1],"coef":[[1.0,-1.0]],"intercept":[0.0]}"#;
        let clf = Classifier::from_json(json).unwrap();
        assert_eq!(clf.n_features(), 2);
        assert_eq!(clf.classes(), &[Label::Int(0), Label::Int(1)]);

        let reloaded = Classifier::from_json(&clf.to_json().unwrap()).unwrap();
        assert_eq!(clf, reloaded);
    }

    #[test]
    fn json_float_classes_are_returned_as_floats() {
        let json = br#"{"kind":"linear","classes":[0.0,1.0],"coef":[[1.0,-1.0]],"intercept":[0.0]}"#;
        let clf = Classifier::from_json(json).unwrap();
        let labels = clf.predict(&FeatureMatrix::from_rows(2, vec![vec![(0, 1.0)], vec![(1, 1.0)]])).unwrap();
        assert_eq!(labels, vec![Label::Float(1.0), Label::Float(0.0)]);
        assert_eq!(serde_json::to_string(&labels).unwrap(), "[1.0,0.0]");
    }

    #[test]
    fn json_unknown_kind_is_parse_error() {
        let err = Classifier::from_json(br#"{"kind":"forest","trees":[]}"#).unwrap_err();
        assert!(matches!(err, ModelError::Parse { .. }));
    }

    #[test]
    fn validate_rejects_inconsistent_shapes() {
        let ragged = Classifier::Linear(LinearModel {
            classes: vec![Label::Int(0), Label::Int(1), Label::Int(2)],
            coef: vec![vec![1.0], vec![1.0, 2.0], vec![0.0]],
            intercept: vec![0.0; 3],
        });
        assert!(ragged.validate().is_err());

        let wrong_rows = Classifier::Linear(LinearModel {
            classes: vec![Label::Int(0), Label::Int(1), Label::Int(2)],
            coef: vec![vec![1.0]],
            intercept: vec![0.0],
        });
        assert!(wrong_rows.validate().is_err());

        let missing_prior = Classifier::MultinomialNb(MultinomialNb {
            classes: vec![Label::Int(0), Label::Int(1)],
            class_log_prior: vec![0.0],
            feature_log_prob: vec![vec![0.0], vec![0.0]],
        });
        assert!(missing_prior.validate().is_err());

        let no_classes = Classifier::Linear(LinearModel {
            classes: vec![],
            coef: vec![],
            intercept: vec![],
        });
        assert!(no_classes.validate().is_err());
    }
}
