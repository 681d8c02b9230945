use std::sync::Arc;

use super::{class_probabilities, rank_descending, PredictionError, StagePredictor};
use crate::inference::Classifier;
use crate::models::grade::SUB_GRADE_COUNT;
use crate::models::{Grade, LoanRecord, SubGrade, SubgradeFields, SubgradeRange, SubgradeResult};

/// Stage 3: subgrade range constrained to the grade supplied with the record.
pub struct SubgradePredictor {
    model: Arc<dyn Classifier>,
}

impl SubgradePredictor {
    pub fn new(model: Arc<dyn Classifier>) -> Self {
        Self { model }
    }
}

/// Turn a 35-class probability vector into a subgrade result for `grade`.
///
/// The range is the two most probable subgrades of `grade`, lower level first.
/// `predicted_subgrade` is the unconstrained argmax over all 35 classes and
/// may belong to another grade.
pub fn derive_subgrade(grade: Grade, proba: &[f64]) -> Option<SubgradeResult> {
    if proba.len() != SUB_GRADE_COUNT {
        return None;
    }
    let ranked: Vec<SubGrade> = rank_descending(proba)
        .into_iter()
        .filter_map(SubGrade::from_ordinal)
        .collect();
    let predicted_subgrade = *ranked.first()?;

    let mut eligible = ranked.iter().filter(|s| s.grade() == grade);
    let first = *eligible.next()?;
    let second = *eligible.next()?;

    Some(SubgradeResult {
        subgrade_category: SubgradeRange::new(first, second),
        predicted_subgrade,
    })
}

impl StagePredictor for SubgradePredictor {
    type Fields = SubgradeFields;
    type Output = SubgradeResult;

    fn model_name(&self) -> &str {
        self.model.name()
    }

    fn predict_record(
        &self,
        position: usize,
        record: &LoanRecord<SubgradeFields>,
    ) -> Result<SubgradeResult, PredictionError> {
        let grade = record
            .grade()
            .ok_or(PredictionError::MissingDependency {
                position,
                field: "grade",
            })?;

        let row = record.feature_row();
        let proba = class_probabilities(self.model.as_ref(), position, &row, SUB_GRADE_COUNT)?;

        derive_subgrade(grade, &proba).ok_or_else(|| PredictionError::MalformedOutput {
            position,
            model: self.model.name().to_string(),
            expected: SUB_GRADE_COUNT,
            actual: proba.len(),
        })
    }
}
