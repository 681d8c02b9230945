use metrics::{counter, histogram};
use serde_json::Value;
use std::time::Instant;

use super::{
    AcceptancePredictor, FailurePolicy, GradePredictor, InterestRatePredictor, PredictionError,
    Predictions, StagePredictor, SubgradePredictor,
};
use crate::inference::ModelStore;
use crate::models::{
    AcceptanceResult, GradeResult, InterestRateResult, LoanRecord, RecordError, Stage,
    StageSchema, SubgradeResult,
};

/// One submitted record that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    pub position: usize,
    pub error: RecordError,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{stage}: {} of the submitted records are invalid", .rejected.len())]
    InvalidRecords {
        stage: Stage,
        rejected: Vec<RejectedRecord>,
    },

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl PipelineError {
    /// One line per failing field, prefixed by record position.
    pub fn details(&self) -> Vec<String> {
        match self {
            PipelineError::InvalidRecords { rejected, .. } => rejected
                .iter()
                .flat_map(|r| {
                    r.error
                        .errors
                        .iter()
                        .map(move |e| format!("record {}: {}", r.position, e))
                })
                .collect(),
            PipelineError::Prediction(_) => Vec::new(),
        }
    }

    /// True when some record lacks an upstream stage result it depends on.
    pub fn is_missing_dependency(&self) -> bool {
        match self {
            PipelineError::InvalidRecords { rejected, .. } => {
                rejected.iter().any(|r| r.error.has_missing_dependency())
            }
            PipelineError::Prediction(PredictionError::MissingDependency { .. }) => true,
            PipelineError::Prediction(_) => false,
        }
    }
}

/// The four stages as independent batch operations over one shared model store.
///
/// Stages are never chained: a subgrade request must already carry its grade.
pub struct LoanPipeline {
    acceptance: AcceptancePredictor,
    grade: GradePredictor,
    subgrade: SubgradePredictor,
    interest_rate: InterestRatePredictor,
    policy: FailurePolicy,
}

impl LoanPipeline {
    pub fn new(store: &ModelStore, policy: FailurePolicy) -> Self {
        Self {
            acceptance: AcceptancePredictor::new(store.acceptance.clone()),
            grade: GradePredictor::new(store.grade.clone()),
            subgrade: SubgradePredictor::new(store.subgrade.clone()),
            interest_rate: InterestRatePredictor::new(store.interest_rate.clone()),
            policy,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Model name serving each stage, in stage order.
    pub fn model_names(&self) -> Vec<(Stage, String)> {
        vec![
            (Stage::Acceptance, self.acceptance.model_name().to_string()),
            (Stage::Grade, self.grade.model_name().to_string()),
            (Stage::Subgrade, self.subgrade.model_name().to_string()),
            (Stage::InterestRate, self.interest_rate.model_name().to_string()),
        ]
    }

    pub fn predict_acceptance(
        &self,
        raw: &[Value],
    ) -> Result<Predictions<AcceptanceResult>, PipelineError> {
        self.run(&self.acceptance, raw)
    }

    pub fn predict_grade(&self, raw: &[Value]) -> Result<Predictions<GradeResult>, PipelineError> {
        self.run(&self.grade, raw)
    }

    pub fn predict_subgrade(
        &self,
        raw: &[Value],
    ) -> Result<Predictions<SubgradeResult>, PipelineError> {
        self.run(&self.subgrade, raw)
    }

    pub fn predict_interest_rate(
        &self,
        raw: &[Value],
    ) -> Result<Predictions<InterestRateResult>, PipelineError> {
        self.run(&self.interest_rate, raw)
    }

    fn run<P: StagePredictor>(
        &self,
        predictor: &P,
        raw: &[Value],
    ) -> Result<Predictions<P::Output>, PipelineError> {
        let start = Instant::now();
        let stage = P::Fields::STAGE.as_str();
        counter!("records_received_total", "stage" => stage).increment(raw.len() as u64);

        let records = parse_batch::<P::Fields>(raw).inspect_err(|e| {
            if let PipelineError::InvalidRecords { rejected, .. } = e {
                counter!("validation_failures_total", "stage" => stage)
                    .increment(rejected.len() as u64);
                tracing::warn!(stage, records = raw.len(), rejected = rejected.len(), "Batch rejected");
            }
        })?;

        let result = predictor.predict_batch(&records, self.policy);

        let elapsed = start.elapsed().as_secs_f64();
        histogram!("stage_latency_seconds", "stage" => stage).record(elapsed);

        match result {
            Ok(predictions) => {
                let failures = predictions.failures().len();
                counter!("predictions_total", "stage" => stage)
                    .increment(predictions.success_count() as u64);
                if failures > 0 {
                    counter!("prediction_failures_total", "stage" => stage)
                        .increment(failures as u64);
                }
                tracing::info!(
                    stage,
                    model = predictor.model_name(),
                    records = predictions.len(),
                    failures,
                    elapsed_ms = elapsed * 1000.0,
                    "Batch predicted"
                );
                Ok(predictions)
            }
            Err(e) => {
                counter!("prediction_failures_total", "stage" => stage).increment(1);
                tracing::error!(
                    stage,
                    model = predictor.model_name(),
                    position = e.position(),
                    error = %e,
                    "Batch prediction failed"
                );
                Err(e.into())
            }
        }
    }
}

/// Validate a whole batch before any model runs; every failing record is reported.
pub fn parse_batch<S: StageSchema>(raw: &[Value]) -> Result<Vec<LoanRecord<S>>, PipelineError> {
    let mut records = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();

    for (position, value) in raw.iter().enumerate() {
        match LoanRecord::<S>::from_json(value) {
            Ok(record) => records.push(record),
            Err(error) => rejected.push(RejectedRecord { position, error }),
        }
    }

    if rejected.is_empty() {
        Ok(records)
    } else {
        Err(PipelineError::InvalidRecords {
            stage: S::STAGE,
            rejected,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
