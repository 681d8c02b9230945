pub mod acceptance;
pub mod aggregator;
pub mod grade;
pub mod interest_rate;
pub mod pipeline;
pub mod subgrade;

pub use acceptance::AcceptancePredictor;
pub use aggregator::{Predictions, ResultAggregator};
pub use grade::{derive_grade, GradePredictor, GRADE_CONFIDENCE_THRESHOLD};
pub use interest_rate::InterestRatePredictor;
pub use pipeline::{LoanPipeline, PipelineError, RejectedRecord};
pub use subgrade::{derive_subgrade, SubgradePredictor};

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use crate::inference::{Classifier, FeatureRow, ModelError};
use crate::models::{LoanRecord, StageSchema};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("record {position}: model `{model}` failed: {source}")]
    Upstream {
        position: usize,
        model: String,
        #[source]
        source: ModelError,
    },

    #[error("record {position}: model `{model}` returned {actual} outputs, expected {expected}")]
    MalformedOutput {
        position: usize,
        model: String,
        expected: usize,
        actual: usize,
    },

    #[error("record {position}: {field} is required for this stage")]
    MissingDependency {
        position: usize,
        field: &'static str,
    },
}

impl PredictionError {
    pub fn position(&self) -> usize {
        match self {
            PredictionError::Upstream { position, .. }
            | PredictionError::MalformedOutput { position, .. }
            | PredictionError::MissingDependency { position, .. } => *position,
        }
    }
}

// ---------------------------------------------------------------------------
// Failure policy
// ---------------------------------------------------------------------------

/// How a batch reacts to one record's prediction failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep going; the failed position is reported without a result.
    Isolate,
    /// Stop at the first failure and fail the whole batch.
    Abort,
}

impl FailurePolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "isolate" => Some(FailurePolicy::Isolate),
            "abort" => Some(FailurePolicy::Abort),
            _ => None,
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Isolate => write!(f, "isolate"),
            FailurePolicy::Abort => write!(f, "abort"),
        }
    }
}

// ---------------------------------------------------------------------------
// StagePredictor
// ---------------------------------------------------------------------------

/// One pipeline stage: a trained model plus the rule turning its raw output into a result.
pub trait StagePredictor: Send + Sync {
    type Fields: StageSchema;
    type Output: Serialize + Send;

    fn model_name(&self) -> &str;

    /// Predict a single record. Calls the model exactly once.
    fn predict_record(
        &self,
        position: usize,
        record: &LoanRecord<Self::Fields>,
    ) -> Result<Self::Output, PredictionError>;

    /// Predict a batch sequentially, keyed by input position.
    fn predict_batch(
        &self,
        records: &[LoanRecord<Self::Fields>],
        policy: FailurePolicy,
    ) -> Result<Predictions<Self::Output>, PredictionError> {
        let mut aggregator = ResultAggregator::new(records.len());

        for (position, record) in records.iter().enumerate() {
            match self.predict_record(position, record) {
                Ok(output) => aggregator.record(position, output),
                Err(e) if policy == FailurePolicy::Abort => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        stage = %Self::Fields::STAGE,
                        position,
                        error = %e,
                        "Record prediction failed, continuing with batch"
                    );
                    aggregator.record_failure(e);
                }
            }
        }

        aggregator.finish()
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Run a classifier and check its probability vector: one entry per expected class,
/// each a finite value in [0, 1].
pub(crate) fn class_probabilities(
    model: &dyn Classifier,
    position: usize,
    row: &FeatureRow,
    expected: usize,
) -> Result<Vec<f64>, PredictionError> {
    let proba = model
        .predict_proba(row)
        .map_err(|source| PredictionError::Upstream {
            position,
            model: model.name().to_string(),
            source,
        })?;

    if proba.len() != expected {
        return Err(PredictionError::MalformedOutput {
            position,
            model: model.name().to_string(),
            expected,
            actual: proba.len(),
        });
    }

    if let Some((class, &value)) = proba
        .iter()
        .enumerate()
        .find(|(_, p)| !(0.0..=1.0).contains(*p))
    {
        return Err(PredictionError::Upstream {
            position,
            model: model.name().to_string(),
            source: ModelError::InvalidProbability { class, value },
        });
    }
    Ok(proba)
}

/// Class indices ordered by descending probability. Ties keep class order.
pub(crate) fn rank_descending(proba: &[f64]) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..proba.len()).collect();
    ranked.sort_by(|&a, &b| proba[b].partial_cmp(&proba[a]).unwrap_or(Ordering::Equal));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier {
        classes: Vec<String>,
        proba: Vec<f64>,
    }

    impl FixedClassifier {
        fn new(proba: Vec<f64>) -> Self {
            Self {
                classes: (0..proba.len()).map(|i| i.to_string()).collect(),
                proba,
            }
        }
    }

    impl Classifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        fn classes(&self) -> &[String] {
            &self.classes
        }

        fn predict_proba(&self, _row: &FeatureRow) -> Result<Vec<f64>, ModelError> {
            Ok(self.proba.clone())
        }
    }

    fn check(proba: Vec<f64>, expected: usize) -> Result<Vec<f64>, PredictionError> {
        let row = FeatureRow::with_capacity(0);
        class_probabilities(&FixedClassifier::new(proba), 3, &row, expected)
    }

    #[test]
    fn test_class_probabilities_accepts_valid_vector() {
        assert_eq!(check(vec![0.0, 0.25, 0.75], 3).unwrap(), vec![0.0, 0.25, 0.75]);
    }

    #[test]
    fn test_class_probabilities_rejects_out_of_range_values() {
        for bad in [f64::NAN, f64::INFINITY, -0.1, 1.5] {
            match check(vec![0.2, bad], 2) {
                Err(PredictionError::Upstream {
                    position,
                    source: ModelError::InvalidProbability { class, .. },
                    ..
                }) => {
                    assert_eq!(position, 3);
                    assert_eq!(class, 1);
                }
                other => panic!("expected invalid probability for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_class_probabilities_rejects_wrong_length() {
        match check(vec![0.5, 0.5], 3) {
            Err(PredictionError::MalformedOutput { expected, actual, .. }) => {
                assert_eq!((expected, actual), (3, 2));
            }
            other => panic!("expected malformed output, got {other:?}"),
        }
    }

    #[test]
    fn test_rank_descending_is_stable() {
        assert_eq!(rank_descending(&[0.1, 0.3, 0.3, 0.2]), vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!(FailurePolicy::from_str("ABORT"), Some(FailurePolicy::Abort));
        assert_eq!(FailurePolicy::from_str("isolate"), Some(FailurePolicy::Isolate));
        assert_eq!(FailurePolicy::from_str("retry"), None);
    }
}
