use std::sync::Arc;

use super::{class_probabilities, rank_descending, PredictionError, StagePredictor};
use crate::inference::Classifier;
use crate::models::{Grade, GradeCategory, GradeFields, GradeResult, LoanRecord, GRADES};

/// Below this top-class probability the grade is reported as a two-grade range.
pub const GRADE_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Stage 2: grade with confidence-based ambiguity resolution.
pub struct GradePredictor {
    model: Arc<dyn Classifier>,
}

impl GradePredictor {
    pub fn new(model: Arc<dyn Classifier>) -> Self {
        Self { model }
    }
}

/// Turn a 7-class probability vector into a grade result.
///
/// `predicted_grade` is always the argmax. `grade_category` is that same grade
/// when its probability reaches [`GRADE_CONFIDENCE_THRESHOLD`], otherwise the
/// two most probable grades in alphabetical order.
pub fn derive_grade(proba: &[f64]) -> Option<GradeResult> {
    if proba.len() != GRADES.len() {
        return None;
    }
    let ranked = rank_descending(proba);
    let best = *ranked.first()?;
    let predicted_grade = Grade::from_ordinal(best)?;

    let grade_category = if proba[best] >= GRADE_CONFIDENCE_THRESHOLD {
        GradeCategory::Single(predicted_grade)
    } else {
        let runner_up = Grade::from_ordinal(*ranked.get(1)?)?;
        GradeCategory::range(predicted_grade, runner_up)
    };

    Some(GradeResult {
        grade_category,
        predicted_grade,
    })
}

impl StagePredictor for GradePredictor {
    type Fields = GradeFields;
    type Output = GradeResult;

    fn model_name(&self) -> &str {
        self.model.name()
    }

    fn predict_record(
        &self,
        position: usize,
        record: &LoanRecord<GradeFields>,
    ) -> Result<GradeResult, PredictionError> {
        let row = record.feature_row();
        let proba = class_probabilities(self.model.as_ref(), position, &row, GRADES.len())?;

        derive_grade(&proba).ok_or_else(|| PredictionError::MalformedOutput {
            position,
            model: self.model.name().to_string(),
            expected: GRADES.len(),
            actual: proba.len(),
        })
    }
}
