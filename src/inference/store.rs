use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::{Classifier, LinearModel, ModelError, Regressor};
use crate::models::{SubGrade, ACCEPTED_REJECTED, GRADES};

pub const ACCEPTANCE_FILE: &str = "step1_acceptance.json";
pub const GRADE_FILE: &str = "step2_grade.json";
pub const SUBGRADE_FILE: &str = "step3_subgrade.json";
pub const INTEREST_RATE_FILE: &str = "step4_interest_rate.json";

/// The four trained models, loaded once at startup and shared read-only.
#[derive(Clone)]
pub struct ModelStore {
    pub acceptance: Arc<dyn Classifier>,
    pub grade: Arc<dyn Classifier>,
    pub subgrade: Arc<dyn Classifier>,
    pub interest_rate: Arc<dyn Regressor>,
}

impl ModelStore {
    /// Assemble a store from already-built models, verifying class orderings.
    pub fn new(
        acceptance: Arc<dyn Classifier>,
        grade: Arc<dyn Classifier>,
        subgrade: Arc<dyn Classifier>,
        interest_rate: Arc<dyn Regressor>,
    ) -> Result<Self, ModelError> {
        check_classes(acceptance.as_ref(), acceptance_labels())?;
        check_classes(grade.as_ref(), grade_labels())?;
        check_classes(subgrade.as_ref(), subgrade_labels())?;

        Ok(Self {
            acceptance,
            grade,
            subgrade,
            interest_rate,
        })
    }

    /// Load all four JSON artifacts from a directory.
    pub fn load_dir<P: AsRef<Path>>(models_dir: P) -> anyhow::Result<Self> {
        let dir = models_dir.as_ref();

        let acceptance = load_model(dir, ACCEPTANCE_FILE)?;
        let grade = load_model(dir, GRADE_FILE)?;
        let subgrade = load_model(dir, SUBGRADE_FILE)?;
        let interest_rate = load_model(dir, INTEREST_RATE_FILE)?;

        let store = Self::new(
            Arc::new(acceptance),
            Arc::new(grade),
            Arc::new(subgrade),
            Arc::new(interest_rate),
        )?;

        info!(models_dir = %dir.display(), "Loaded 4 stage models");
        Ok(store)
    }
}

fn load_model(dir: &Path, file: &str) -> anyhow::Result<LinearModel> {
    let path = dir.join(file);
    info!(path = %path.display(), "Loading model artifact");

    let model = LinearModel::load(&path)
        .with_context(|| format!("Failed to load model from {}", path.display()))?;

    info!(
        model = %model.name,
        kind = ?model.kind,
        outputs = model.outputs(),
        "Model loaded successfully"
    );
    Ok(model)
}

fn check_classes(model: &dyn Classifier, expected: Vec<String>) -> Result<(), ModelError> {
    if model.classes() == expected.as_slice() {
        Ok(())
    } else {
        Err(ModelError::ClassOrder {
            model: model.name().to_string(),
            expected,
            found: model.classes().to_vec(),
        })
    }
}

pub fn acceptance_labels() -> Vec<String> {
    ACCEPTED_REJECTED
        .iter()
        .map(|d| d.class_label().to_string())
        .collect()
}

pub fn grade_labels() -> Vec<String> {
    GRADES.iter().map(|g| g.as_str().to_string()).collect()
}

pub fn subgrade_labels() -> Vec<String> {
    SubGrade::labels().iter().map(|s| s.to_string()).collect()
}
