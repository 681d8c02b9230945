use std::sync::Arc;

use super::{PredictionError, StagePredictor};
use crate::inference::{ModelError, Regressor};
use crate::models::{InterestRateFields, InterestRateResult, LoanRecord};

/// Stage 4: interest-rate point estimate, passed through as the model returns it.
pub struct InterestRatePredictor {
    model: Arc<dyn Regressor>,
}

impl InterestRatePredictor {
    pub fn new(model: Arc<dyn Regressor>) -> Self {
        Self { model }
    }
}

impl StagePredictor for InterestRatePredictor {
    type Fields = InterestRateFields;
    type Output = InterestRateResult;

    fn model_name(&self) -> &str {
        self.model.name()
    }

    fn predict_record(
        &self,
        position: usize,
        record: &LoanRecord<InterestRateFields>,
    ) -> Result<InterestRateResult, PredictionError> {
        let upstream = |source: ModelError| PredictionError::Upstream {
            position,
            model: self.model.name().to_string(),
            source,
        };

        let row = record.feature_row();
        let interest_rate = self.model.predict(&row).map_err(upstream)?;
        if !interest_rate.is_finite() {
            return Err(upstream(ModelError::NonFinite));
        }

        Ok(InterestRateResult { interest_rate })
    }
}
