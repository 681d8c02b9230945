//! Model store seam: the traits the stage predictors call, the flat row they
//! feed, and the JSON linear-model artifact loaded at startup.

pub mod linear;
pub mod store;

pub use linear::{LinearModel, ModelKind};
pub use store::ModelStore;

/// A single model input cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feature {
    Numeric(f64),
    Category(&'static str),
}

/// One row of named model inputs, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    columns: Vec<(&'static str, Feature)>,
}

impl FeatureRow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, name: &'static str, feature: Feature) {
        self.columns.push((name, feature));
    }

    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.columns
            .iter()
            .find(|(column, _)| *column == name)
            .map(|(_, feature)| feature)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("feature `{0}` missing from input row")]
    MissingFeature(String),

    #[error("feature `{feature}` has the wrong type: expected {expected}")]
    FeatureType {
        feature: String,
        expected: &'static str,
    },

    #[error("model `{model}` is a {actual} model, expected {expected}")]
    WrongKind {
        model: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid model artifact `{model}`: {reason}")]
    InvalidArtifact { model: String, reason: String },

    #[error("class ordering mismatch for `{model}`: expected {expected:?}, found {found:?}")]
    ClassOrder {
        model: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("model produced a non-finite output")]
    NonFinite,

    #[error("probability {value} for class {class} is outside [0, 1]")]
    InvalidProbability { class: usize, value: f64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A trained classifier with a fixed class ordering.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// Class labels in the order of the probability vector.
    fn classes(&self) -> &[String];

    /// Probability per class, aligned to [`Classifier::classes`].
    fn predict_proba(&self, row: &FeatureRow) -> Result<Vec<f64>, ModelError>;

    /// Index of the most probable class. The first maximum wins on ties.
    fn predict(&self, row: &FeatureRow) -> Result<usize, ModelError> {
        let proba = self.predict_proba(row)?;
        argmax(&proba).ok_or(ModelError::NonFinite)
    }
}

/// A trained regressor producing one value per row.
pub trait Regressor: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, row: &FeatureRow) -> Result<f64, ModelError>;
}

/// Index of the largest value; `None` for an empty slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, max)) if v <= max => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_first_maximum_wins() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[]), None);
    }
}
