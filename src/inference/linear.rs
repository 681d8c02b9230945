//! JSON linear model artifact.
//!
//! A multinomial logistic classifier (`softmax`) or a linear regressor
//! (`identity`) exported from training as plain JSON. Numeric inputs are
//! standardized with the training mean/scale; categorical inputs are one-hot
//! weight tables keyed by canonical value, where an unseen value contributes
//! nothing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::{Classifier, Feature, FeatureRow, ModelError, Regressor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Softmax,
    Identity,
}

impl ModelKind {
    fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Softmax => "softmax",
            ModelKind::Identity => "identity",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericTerm {
    pub feature: String,
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
    pub weights: Vec<f64>,
}

fn unit_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalTerm {
    pub feature: String,
    pub weights: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub name: String,
    pub kind: ModelKind,
    #[serde(default)]
    pub classes: Vec<String>,
    pub intercepts: Vec<f64>,
    #[serde(default)]
    pub numeric: Vec<NumericTerm>,
    #[serde(default)]
    pub categorical: Vec<CategoricalTerm>,
}

impl LinearModel {
    /// Loads and validates a model artifact.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let json = fs::read_to_string(path)?;
        let model: LinearModel = serde_json::from_str(&json)?;
        model.validate()?;
        Ok(model)
    }

    /// Number of raw outputs: one per class, or one for a regressor.
    pub fn outputs(&self) -> usize {
        match self.kind {
            ModelKind::Softmax => self.classes.len(),
            ModelKind::Identity => 1,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |reason: String| ModelError::InvalidArtifact {
            model: self.name.clone(),
            reason,
        };

        if self.kind == ModelKind::Softmax && self.classes.len() < 2 {
            return Err(invalid("a softmax model needs at least two classes".into()));
        }
        let outputs = self.outputs();
        if self.intercepts.len() != outputs {
            return Err(invalid(format!(
                "{} intercepts for {} outputs",
                self.intercepts.len(),
                outputs
            )));
        }
        for term in &self.numeric {
            if term.weights.len() != outputs {
                return Err(invalid(format!(
                    "`{}` has {} weights for {} outputs",
                    term.feature,
                    term.weights.len(),
                    outputs
                )));
            }
            if !term.scale.is_finite() || term.scale == 0.0 {
                return Err(invalid(format!("`{}` has an unusable scale", term.feature)));
            }
        }
        for term in &self.categorical {
            for (value, weights) in &term.weights {
                if weights.len() != outputs {
                    return Err(invalid(format!(
                        "`{}={}` has {} weights for {} outputs",
                        term.feature,
                        value,
                        weights.len(),
                        outputs
                    )));
                }
            }
        }
        Ok(())
    }

    /// Raw linear scores, one per output.
    pub fn decision_function(&self, row: &FeatureRow) -> Result<Vec<f64>, ModelError> {
        let mut scores = self.intercepts.clone();

        for term in &self.numeric {
            let x = match row.get(&term.feature) {
                Some(Feature::Numeric(x)) => *x,
                Some(Feature::Category(_)) => {
                    return Err(ModelError::FeatureType {
                        feature: term.feature.clone(),
                        expected: "number",
                    })
                }
                None => return Err(ModelError::MissingFeature(term.feature.clone())),
            };
            let z = (x - term.mean) / term.scale;
            for (score, w) in scores.iter_mut().zip(&term.weights) {
                *score += w * z;
            }
        }

        for term in &self.categorical {
            let value = match row.get(&term.feature) {
                Some(Feature::Category(value)) => *value,
                Some(Feature::Numeric(_)) => {
                    return Err(ModelError::FeatureType {
                        feature: term.feature.clone(),
                        expected: "category",
                    })
                }
                None => return Err(ModelError::MissingFeature(term.feature.clone())),
            };
            if let Some(weights) = term.weights.get(value) {
                for (score, w) in scores.iter_mut().zip(weights) {
                    *score += w;
                }
            }
        }

        if scores.iter().all(|s| s.is_finite()) {
            Ok(scores)
        } else {
            Err(ModelError::NonFinite)
        }
    }

    fn expect_kind(&self, expected: ModelKind) -> Result<(), ModelError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(ModelError::WrongKind {
                model: self.name.clone(),
                expected: expected.as_str(),
                actual: self.kind.as_str(),
            })
        }
    }
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl Classifier for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, row: &FeatureRow) -> Result<Vec<f64>, ModelError> {
        self.expect_kind(ModelKind::Softmax)?;
        Ok(softmax(&self.decision_function(row)?))
    }
}

impl Regressor for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        self.expect_kind(ModelKind::Identity)?;
        let scores = self.decision_function(row)?;
        scores.first().copied().ok_or(ModelError::NonFinite)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn binary_model() -> LinearModel {
        serde_json::from_value(json!({
            "name": "test_acceptance",
            "kind": "softmax",
            "classes": ["Rejected", "Accepted"],
            "intercepts": [0.0, 0.0],
            "numeric": [
                { "feature": "loan_amnt", "mean": 1000.0, "scale": 1000.0, "weights": [0.0, -1.0] }
            ],
            "categorical": [
                { "feature": "purpose", "weights": { "car": [0.0, 2.0] } }
            ]
        }))
        .unwrap()
    }

    fn row(amount: f64, purpose: &'static str) -> FeatureRow {
        let mut row = FeatureRow::default();
        row.push("loan_amnt", Feature::Numeric(amount));
        row.push("purpose", Feature::Category(purpose));
        row
    }

    #[test]
    fn test_softmax_probabilities_sum_to_one() {
        let model = binary_model();
        model.validate().unwrap();
        let proba = model.predict_proba(&row(1000.0, "other")).unwrap();
        assert_eq!(proba, vec![0.5, 0.5]);

        let proba = model.predict_proba(&row(1000.0, "car")).unwrap();
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(proba[1] > 0.88);
        assert_eq!(Classifier::predict(&model, &row(1000.0, "car")).unwrap(), 1);
    }

    #[test]
    fn test_missing_and_mistyped_features() {
        let model = binary_model();
        let mut partial = FeatureRow::default();
        partial.push("purpose", Feature::Category("car"));
        assert!(matches!(
            model.predict_proba(&partial),
            Err(ModelError::MissingFeature(f)) if f == "loan_amnt"
        ));

        let mut mistyped = FeatureRow::default();
        mistyped.push("loan_amnt", Feature::Category("big"));
        mistyped.push("purpose", Feature::Category("car"));
        assert!(matches!(
            model.predict_proba(&mistyped),
            Err(ModelError::FeatureType { .. })
        ));
    }

    #[test]
    fn test_shape_validation() {
        let mut model = binary_model();
        model.numeric[0].weights.push(1.0);
        assert!(matches!(
            model.validate(),
            Err(ModelError::InvalidArtifact { .. })
        ));
    }

    #[test]
    fn test_regressor_kind_enforced() {
        let regressor: LinearModel = serde_json::from_value(json!({
            "name": "test_rate",
            "kind": "identity",
            "intercepts": [12.5],
            "numeric": [{ "feature": "loan_amnt", "weights": [0.001] }]
        }))
        .unwrap();
        regressor.validate().unwrap();
        let rate = Regressor::predict(&regressor, &row(1000.0, "car")).unwrap();
        assert!((rate - 13.5).abs() < 1e-9);
        assert!(matches!(
            regressor.predict_proba(&row(1000.0, "car")),
            Err(ModelError::WrongKind { .. })
        ));
    }
}
