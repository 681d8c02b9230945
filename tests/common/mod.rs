use std::sync::Arc;

use loanstages::api::router::create_router;
use loanstages::config::AppConfig;
use loanstages::inference::{Classifier, Feature, FeatureRow, ModelError, ModelStore, Regressor};
use loanstages::inference::store::{acceptance_labels, grade_labels, subgrade_labels};
use loanstages::models::SubGrade;
use loanstages::prediction::{FailurePolicy, LoanPipeline};
use loanstages::AppState;

/// `loan_amnt` that makes every stub model fail.
#[allow(dead_code)]
pub const FAILING_AMOUNT: f64 = 666.0;

type ProbaFn = dyn Fn(&FeatureRow) -> Result<Vec<f64>, ModelError> + Send + Sync;

/// Classifier whose output is computed by a closure over the input row.
pub struct StubClassifier {
    name: String,
    classes: Vec<String>,
    proba: Box<ProbaFn>,
}

impl StubClassifier {
    pub fn new<F>(name: &str, classes: Vec<String>, proba: F) -> Self
    where
        F: Fn(&FeatureRow) -> Result<Vec<f64>, ModelError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            classes,
            proba: Box::new(proba),
        }
    }
}

impl Classifier for StubClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, row: &FeatureRow) -> Result<Vec<f64>, ModelError> {
        (self.proba)(row)
    }
}

pub struct StubRegressor {
    value: f64,
}

impl Regressor for StubRegressor {
    fn name(&self) -> &str {
        "stub_interest_rate"
    }

    fn predict(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        fail_on_marker(row)?;
        Ok(self.value)
    }
}

fn fail_on_marker(row: &FeatureRow) -> Result<(), ModelError> {
    match row.get("loan_amnt") {
        Some(Feature::Numeric(amount)) if *amount == FAILING_AMOUNT => {
            Err(ModelError::MissingFeature("stub_failure".into()))
        }
        _ => Ok(()),
    }
}

/// Subgrade probabilities with the given labels set and the rest spread evenly.
pub fn subgrade_proba(entries: &[(&str, f64)]) -> Vec<f64> {
    let count = SubGrade::labels().len();
    let assigned: f64 = entries.iter().map(|(_, p)| p).sum();
    let rest = (1.0 - assigned) / (count - entries.len()) as f64;
    let mut proba = vec![rest; count];
    for (label, p) in entries {
        if let Some(sub) = SubGrade::from_label(label) {
            proba[sub.ordinal()] = *p;
        }
    }
    proba
}

/// Stub models with fixed outputs:
/// acceptance [0.2, 0.8], grade "A-B" / "B", subgrade B3 0.4 / B1 0.3, rate 13.5.
pub fn stub_store() -> ModelStore {
    let acceptance = StubClassifier::new("stub_acceptance", acceptance_labels(), |row| {
        fail_on_marker(row)?;
        Ok(vec![0.2, 0.8])
    });
    let grade = StubClassifier::new("stub_grade", grade_labels(), |row| {
        fail_on_marker(row)?;
        Ok(vec![0.3, 0.35, 0.1, 0.1, 0.05, 0.05, 0.05])
    });
    let subgrade = StubClassifier::new("stub_subgrade", subgrade_labels(), |row| {
        fail_on_marker(row)?;
        Ok(subgrade_proba(&[("B3", 0.4), ("B1", 0.3)]))
    });

    ModelStore::new(
        Arc::new(acceptance),
        Arc::new(grade),
        Arc::new(subgrade),
        Arc::new(StubRegressor { value: 13.5 }),
    )
    .expect("stub class orderings are canonical")
}

/// The demo artifacts shipped in `models/`.
#[allow(dead_code)]
pub fn shipped_store() -> ModelStore {
    ModelStore::load_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/models"))
        .expect("shipped models should load")
}

#[allow(dead_code)]
pub fn build_test_app(policy: FailurePolicy) -> axum::Router {
    build_test_app_with(stub_store(), policy, 100)
}

#[allow(dead_code)]
pub fn build_test_app_with(
    store: ModelStore,
    policy: FailurePolicy,
    max_batch_size: usize,
) -> axum::Router {
    let metrics_handle = loanstages::metrics::init_metrics().expect("metrics recorder");

    let config = AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        failure_policy: policy,
        max_batch_size,
        ..AppConfig::default()
    };

    let state = AppState {
        pipeline: Arc::new(LoanPipeline::new(&store, policy)),
        config,
        metrics_handle,
    };

    create_router(state)
}
