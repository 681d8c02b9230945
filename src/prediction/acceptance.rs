use std::sync::Arc;

use super::{class_probabilities, PredictionError, StagePredictor};
use crate::inference::{argmax, Classifier};
use crate::models::{AcceptanceFields, AcceptanceResult, LoanRecord, ACCEPTED_REJECTED};

const REJECTED: usize = 0;
const ACCEPTED: usize = 1;

/// Stage 1: binary accept/reject with the model's class probabilities.
pub struct AcceptancePredictor {
    model: Arc<dyn Classifier>,
}

impl AcceptancePredictor {
    pub fn new(model: Arc<dyn Classifier>) -> Self {
        Self { model }
    }
}

/// The decision is the argmax of the probability vector, nothing more.
pub fn derive_acceptance(proba: &[f64]) -> Option<AcceptanceResult> {
    let decision = *ACCEPTED_REJECTED.get(argmax(proba)?)?;
    Some(AcceptanceResult {
        decision,
        accepted_probability: *proba.get(ACCEPTED)?,
        rejected_probability: *proba.get(REJECTED)?,
    })
}

impl StagePredictor for AcceptancePredictor {
    type Fields = AcceptanceFields;
    type Output = AcceptanceResult;

    fn model_name(&self) -> &str {
        self.model.name()
    }

    fn predict_record(
        &self,
        position: usize,
        record: &LoanRecord<AcceptanceFields>,
    ) -> Result<AcceptanceResult, PredictionError> {
        let row = record.feature_row();
        let proba = class_probabilities(
            self.model.as_ref(),
            position,
            &row,
            ACCEPTED_REJECTED.len(),
        )?;

        derive_acceptance(&proba).ok_or_else(|| PredictionError::MalformedOutput {
            position,
            model: self.model.name().to_string(),
            expected: ACCEPTED_REJECTED.len(),
            actual: proba.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Decision;

    #[test]
    fn test_positive_class_accepts() {
        let result = derive_acceptance(&[0.2, 0.8]).unwrap();
        assert_eq!(result.decision, Decision::Accepted);
        assert_eq!(result.accepted_probability, 0.8);
        assert_eq!(result.rejected_probability, 0.2);
    }

    #[test]
    fn test_negative_class_rejects() {
        let result = derive_acceptance(&[0.65, 0.35]).unwrap();
        assert_eq!(result.decision, Decision::Rejected);
    }

    #[test]
    fn test_tie_goes_to_first_class() {
        assert_eq!(derive_acceptance(&[0.5, 0.5]).unwrap().decision, Decision::Rejected);
    }
}
