use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

use crate::inference::{Feature, FeatureRow};
use crate::normalizer::{self, ValidationError};

use super::fields::{
    ApplicationType, DtiBucket, EmpLength, HomeOwnership, JointVerification, LoanSizeBucket,
    Purpose, Term, VerificationStatus,
};
use super::grade::{Grade, SubGrade};
use super::schema::{Derived, Requirement, StageSchema};

// ---------------------------------------------------------------------------
// FieldValue: canonical, typed field content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Number(f64),
    EmpLength(EmpLength),
    Purpose(Purpose),
    Term(Term),
    Verification(VerificationStatus),
    JointVerification(JointVerification),
    HomeOwnership(HomeOwnership),
    ApplicationType(ApplicationType),
    Grade(Grade),
    SubGrade(SubGrade),
}

impl FieldValue {
    /// The encoding the models were trained on.
    pub fn feature(&self) -> Feature {
        match *self {
            FieldValue::Number(v) => Feature::Numeric(v),
            FieldValue::EmpLength(e) => Feature::Numeric(e.ordinal() as f64),
            FieldValue::Purpose(p) => Feature::Category(p.canonical()),
            FieldValue::Term(t) => Feature::Numeric(t.months() as f64),
            FieldValue::Verification(v) => Feature::Category(v.label()),
            FieldValue::JointVerification(j) => Feature::Category(j.canonical()),
            FieldValue::HomeOwnership(h) => Feature::Category(h.label()),
            FieldValue::ApplicationType(a) => Feature::Category(a.label()),
            FieldValue::Grade(g) => Feature::Category(g.as_str()),
            FieldValue::SubGrade(s) => Feature::Category(s.as_str()),
        }
    }

    /// Human-facing JSON form, as a client would submit it.
    pub fn to_json(&self) -> Value {
        match *self {
            FieldValue::Number(v) => Value::from(v),
            FieldValue::EmpLength(e) => Value::from(e.label()),
            FieldValue::Purpose(p) => Value::from(p.label()),
            FieldValue::Term(t) => Value::from(t.months()),
            FieldValue::Verification(v) => Value::from(v.label()),
            FieldValue::JointVerification(j) => Value::from(j.canonical()),
            FieldValue::HomeOwnership(h) => Value::from(h.label()),
            FieldValue::ApplicationType(a) => Value::from(a.label()),
            FieldValue::Grade(g) => Value::from(g.as_str()),
            FieldValue::SubGrade(s) => Value::from(s.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// Record errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("{field} is required for this stage: {hint}")]
    MissingDependency {
        field: &'static str,
        hint: &'static str,
    },
}

impl FieldError {
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::Invalid(e) => e.field,
            FieldError::MissingDependency { field, .. } => field,
        }
    }
}

/// Every field failure of one submitted record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", join_messages(.errors))]
pub struct RecordError {
    pub errors: Vec<FieldError>,
}

impl RecordError {
    pub fn has_missing_dependency(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, FieldError::MissingDependency { .. }))
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// LoanRecord
// ---------------------------------------------------------------------------

/// A validated, canonical loan record for one stage. Immutable once built.
#[derive(Clone)]
pub struct LoanRecord<S: StageSchema> {
    values: Vec<(&'static str, FieldValue)>,
    _stage: PhantomData<S>,
}

impl<S: StageSchema> LoanRecord<S> {
    /// Build a record from one submitted JSON object.
    ///
    /// Absent or `null` fields take their schema default; unknown keys are ignored.
    /// All failing fields are reported together.
    pub fn from_json(raw: &Value) -> Result<Self, RecordError> {
        let Some(object) = raw.as_object() else {
            return Err(RecordError {
                errors: vec![ValidationError::not_an_object(raw).into()],
            });
        };

        let mut values = Vec::new();
        let mut errors = Vec::new();

        for spec in S::fields() {
            match object.get(spec.name).filter(|v| !v.is_null()) {
                Some(value) => match normalizer::normalize(spec, value) {
                    Ok(canonical) => values.push((spec.name, canonical)),
                    Err(e) => errors.push(FieldError::Invalid(e)),
                },
                None => match spec.requirement {
                    Requirement::Default(default) => values.push((spec.name, default)),
                    Requirement::Dependency { hint } => errors.push(FieldError::MissingDependency {
                        field: spec.name,
                        hint,
                    }),
                },
            }
        }

        let record = Self {
            values,
            _stage: PhantomData,
        };

        // Only records carrying both dependencies can disagree.
        if let (Some(grade), Some(sub_grade)) = (record.grade(), record.sub_grade()) {
            if sub_grade.grade() != grade {
                errors.push(ValidationError::sub_grade_outside_grade(grade, sub_grade).into());
            }
        }

        if errors.is_empty() {
            Ok(record)
        } else {
            Err(RecordError { errors })
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            FieldValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn grade(&self) -> Option<Grade> {
        match self.get("grade")? {
            FieldValue::Grade(g) => Some(*g),
            _ => None,
        }
    }

    pub fn sub_grade(&self) -> Option<SubGrade> {
        match self.get("sub_grade")? {
            FieldValue::SubGrade(s) => Some(*s),
            _ => None,
        }
    }

    // --- derived, computed on read ---

    pub fn fico_average(&self) -> Option<f64> {
        Some(midpoint(self.number("fico_range_low")?, self.number("fico_range_high")?))
    }

    pub fn fico_range(&self) -> Option<f64> {
        Some(self.number("fico_range_high")? - self.number("fico_range_low")?)
    }

    pub fn sec_app_fico_average(&self) -> Option<f64> {
        Some(midpoint(
            self.number("sec_app_fico_range_low")?,
            self.number("sec_app_fico_range_high")?,
        ))
    }

    pub fn sec_app_fico_range(&self) -> Option<f64> {
        Some(self.number("sec_app_fico_range_high")? - self.number("sec_app_fico_range_low")?)
    }

    pub fn loan_to_income(&self) -> Option<f64> {
        let income = self.number("annual_inc")?;
        if income <= 0.0 {
            return None;
        }
        Some(self.number("loan_amnt")? / income)
    }

    pub fn loan_size_bucket(&self) -> Option<LoanSizeBucket> {
        self.number("loan_amnt").map(LoanSizeBucket::from_amount)
    }

    pub fn dti_bucket(&self) -> Option<DtiBucket> {
        self.number("dti").map(DtiBucket::from_dti)
    }

    pub fn derived(&self, derived: Derived) -> Option<Feature> {
        match derived {
            Derived::FicoAverage => self.fico_average().map(Feature::Numeric),
            Derived::FicoRange => self.fico_range().map(Feature::Numeric),
            Derived::SecAppFicoAverage => self.sec_app_fico_average().map(Feature::Numeric),
            Derived::SecAppFicoRange => self.sec_app_fico_range().map(Feature::Numeric),
            Derived::LoanToIncome => self.loan_to_income().map(Feature::Numeric),
            Derived::LoanSizeBucket => self.loan_size_bucket().map(|b| Feature::Category(b.label())),
            Derived::DtiBucket => self.dti_bucket().map(|b| Feature::Category(b.label())),
        }
    }

    /// Flat model input: stored fields in schema order, then the stage's derived features.
    pub fn feature_row(&self) -> FeatureRow {
        let mut row = FeatureRow::with_capacity(self.values.len() + S::DERIVED.len());
        for (name, value) in &self.values {
            row.push(*name, value.feature());
        }
        for derived in S::DERIVED {
            if let Some(feature) = self.derived(*derived) {
                row.push(derived.column(), feature);
            }
        }
        row
    }
}

fn midpoint(low: f64, high: f64) -> f64 {
    (low + high) / 2.0
}

impl<S: StageSchema> fmt::Debug for LoanRecord<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoanRecord")
            .field("stage", &S::STAGE)
            .field("values", &self.values)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::{AcceptanceFields, GradeFields, InterestRateFields, SubgradeFields};
    use serde_json::json;

    #[test]
    fn test_defaults_fill_absent_and_null_fields() {
        let record =
            LoanRecord::<AcceptanceFields>::from_json(&json!({ "loan_amnt": 1000, "dti": null }))
                .unwrap();
        assert_eq!(record.number("loan_amnt"), Some(1000.0));
        assert_eq!(record.number("dti"), Some(0.308));
        assert_eq!(
            record.get("purpose"),
            Some(&FieldValue::Purpose(Purpose::Other))
        );
    }

    #[test]
    fn test_all_failures_reported() {
        let err = LoanRecord::<AcceptanceFields>::from_json(&json!({
            "loan_amnt": 0,
            "purpose": "boat",
            "unknown_field": "ignored",
        }))
        .unwrap_err();
        let fields: Vec<&str> = err.errors.iter().map(|e| e.field()).collect();
        assert_eq!(fields, vec!["loan_amnt", "purpose"]);
    }

    #[test]
    fn test_non_object_rejected() {
        let err = LoanRecord::<AcceptanceFields>::from_json(&json!([1, 2])).unwrap_err();
        assert_eq!(err.errors[0].field(), "record");
    }

    #[test]
    fn test_subgrade_record_without_grade_is_missing_dependency() {
        let err = LoanRecord::<SubgradeFields>::from_json(&json!({})).unwrap_err();
        assert!(err.has_missing_dependency());
        assert!(err.to_string().contains("grade is required"));
    }

    #[test]
    fn test_interest_rate_record_needs_both_dependencies() {
        let err = LoanRecord::<InterestRateFields>::from_json(&json!({ "grade": "C" })).unwrap_err();
        let fields: Vec<&str> = err.errors.iter().map(|e| e.field()).collect();
        assert_eq!(fields, vec!["sub_grade"]);
    }

    #[test]
    fn test_sub_grade_must_fall_within_grade() {
        let err = LoanRecord::<InterestRateFields>::from_json(&json!({
            "grade": "A",
            "sub_grade": "G5",
        }))
        .unwrap_err();
        assert!(!err.has_missing_dependency());
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].field(), "sub_grade");
        assert!(err.to_string().contains("within grade A, received value - G5"));

        let record = LoanRecord::<InterestRateFields>::from_json(&json!({
            "grade": "G",
            "sub_grade": "G5",
        }))
        .unwrap();
        assert_eq!(record.sub_grade().map(|s| s.as_str()), Some("G5"));
    }

    #[test]
    fn test_derived_fields() {
        let record = LoanRecord::<SubgradeFields>::from_json(&json!({
            "grade": "B",
            "fico_range_low": 700,
            "fico_range_high": 704,
            "loan_amnt": 12000,
            "annual_inc": 60000,
            "dti": 27.5,
        }))
        .unwrap();
        assert_eq!(record.fico_average(), Some(702.0));
        assert_eq!(record.fico_range(), Some(4.0));
        assert_eq!(record.sec_app_fico_average(), Some(567.0));
        assert_eq!(record.loan_to_income(), Some(0.2));
        assert_eq!(record.loan_size_bucket(), Some(LoanSizeBucket::From10KTo20K));
        assert_eq!(record.dti_bucket(), Some(DtiBucket::High));
    }

    #[test]
    fn test_feature_row_uses_canonical_encodings() {
        let record = LoanRecord::<AcceptanceFields>::from_json(&json!({
            "emp_length": "10+ years",
            "purpose": "renewable_energy",
        }))
        .unwrap();
        let row = record.feature_row();
        assert_eq!(row.get("loan_amnt"), Some(&Feature::Numeric(2500.0)));
        assert_eq!(row.get("dti"), Some(&Feature::Numeric(0.308)));
        assert!(row.get("fico_avg").is_none());
        assert_eq!(row.get("emp_length"), Some(&Feature::Numeric(10.0)));
        assert_eq!(row.get("purpose"), Some(&Feature::Category("renew energi")));
    }

    #[test]
    fn test_grade_stage_row_has_derived_columns() {
        let record = LoanRecord::<GradeFields>::from_json(&json!({})).unwrap();
        let row = record.feature_row();
        assert!(row.get("fico_avg").is_some());
        assert!(row.get("loan_to_income").is_some());
        assert!(row.get("dti_bucket").is_none());
        assert_eq!(row.get("term"), Some(&Feature::Numeric(36.0)));
    }
}
