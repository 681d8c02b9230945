//! Field normalizer: raw JSON values to the canonical values the models expect.
//!
//! Pure functions. A value is translated exactly once, when the record is built.

use serde_json::Value;

use crate::models::fields::{
    ApplicationType, EmpLength, HomeOwnership, JointVerification, Purpose, Term,
    VerificationStatus,
};
use crate::models::grade::{Grade, SubGrade};
use crate::models::loan::FieldValue;
use crate::models::schema::{FieldKind, FieldSpec};

/// A field failed its range or membership constraint.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub received: String,
    pub message: String,
}

impl ValidationError {
    fn below_minimum(field: &'static str, min: f64, received: &Value) -> Self {
        let received = render(received);
        Self {
            field,
            message: format!("expected {field} >= {min}, received value - {received}"),
            received,
        }
    }

    fn above_maximum(field: &'static str, max: f64, received: &Value) -> Self {
        let received = render(received);
        Self {
            field,
            message: format!("expected {field} <= {max}, received value - {received}"),
            received,
        }
    }

    fn not_a_number(field: &'static str, received: &Value) -> Self {
        let received = render(received);
        Self {
            field,
            message: format!("expected {field} to be a finite number, received value - {received}"),
            received,
        }
    }

    fn not_one_of(field: &'static str, kind: &FieldKind, received: &Value) -> Self {
        let received = render(received);
        Self {
            field,
            message: format!(
                "expected {field} values are {:?}. Received value - {received}",
                kind.accepted_labels()
            ),
            received,
        }
    }

    pub fn sub_grade_outside_grade(grade: Grade, sub_grade: SubGrade) -> Self {
        let received = sub_grade.to_string();
        Self {
            field: "sub_grade",
            message: format!(
                "expected sub_grade within grade {grade}, received value - {received}"
            ),
            received,
        }
    }

    pub fn not_an_object(received: &Value) -> Self {
        let received = render(received);
        Self {
            field: "record",
            message: format!("expected a JSON object per loan record, received value - {received}"),
            received,
        }
    }
}

/// Validate and canonicalize one field value against its spec.
pub fn normalize(spec: &FieldSpec, raw: &Value) -> Result<FieldValue, ValidationError> {
    let field = spec.name;
    let kind = &spec.kind;
    let invalid = || ValidationError::not_one_of(field, kind, raw);

    match *kind {
        FieldKind::Numeric { min, max } => {
            let value = as_number(raw).ok_or_else(|| ValidationError::not_a_number(field, raw))?;
            if value < min {
                return Err(ValidationError::below_minimum(field, min, raw));
            }
            if value > max {
                return Err(ValidationError::above_maximum(field, max, raw));
            }
            Ok(FieldValue::Number(value))
        }
        FieldKind::EmpLength => emp_length(raw)
            .map(FieldValue::EmpLength)
            .ok_or_else(invalid),
        FieldKind::Purpose => raw
            .as_str()
            .and_then(Purpose::parse)
            .map(FieldValue::Purpose)
            .ok_or_else(invalid),
        FieldKind::Term => term(raw).map(FieldValue::Term).ok_or_else(invalid),
        FieldKind::Verification => raw
            .as_str()
            .and_then(VerificationStatus::parse)
            .map(FieldValue::Verification)
            .ok_or_else(invalid),
        FieldKind::JointVerification => raw
            .as_str()
            .and_then(JointVerification::parse)
            .map(FieldValue::JointVerification)
            .ok_or_else(invalid),
        FieldKind::HomeOwnership => raw
            .as_str()
            .and_then(HomeOwnership::parse)
            .map(FieldValue::HomeOwnership)
            .ok_or_else(invalid),
        FieldKind::ApplicationType => raw
            .as_str()
            .and_then(ApplicationType::parse)
            .map(FieldValue::ApplicationType)
            .ok_or_else(invalid),
        FieldKind::Grade => raw
            .as_str()
            .and_then(Grade::from_label)
            .map(FieldValue::Grade)
            .ok_or_else(invalid),
        FieldKind::SubGrade => raw
            .as_str()
            .and_then(SubGrade::from_label)
            .map(FieldValue::SubGrade)
            .ok_or_else(invalid),
    }
}

/// Numbers arrive as JSON numbers or, from CSV uploads, as numeric strings.
fn as_number(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Accepts a bucket label ("5 years"), an ordinal string ("5", "5.0") or a JSON number.
/// Decimal forms are truncated toward zero.
fn emp_length(raw: &Value) -> Option<EmpLength> {
    let ordinal = match raw {
        Value::String(s) => {
            if let Some(bucket) = EmpLength::from_label(s) {
                return Some(bucket);
            }
            let s = s.trim();
            if s.contains('.') {
                truncate(s.parse::<f64>().ok()?)?
            } else {
                s.parse::<i64>().ok()?
            }
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => truncate(n.as_f64()?)?,
        },
        _ => return None,
    };
    EmpLength::from_ordinal(ordinal)
}

fn term(raw: &Value) -> Option<Term> {
    match raw {
        Value::String(s) => Term::parse(s),
        Value::Number(n) => match n.as_i64() {
            Some(months) => Term::from_months(months),
            None => {
                let months = n.as_f64()?;
                if months.fract() == 0.0 {
                    Term::from_months(months as i64)
                } else {
                    None
                }
            }
        },
        _ => None,
    }
}

fn truncate(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.trunc() as i64)
}

fn render(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::{AcceptanceFields, GradeFields, StageSchema, SubgradeFields};
    use serde_json::json;

    fn spec<S: StageSchema>(name: &str) -> &'static FieldSpec {
        S::fields().find(|f| f.name == name).expect("field exists")
    }

    #[test]
    fn test_emp_length_forms_agree() {
        let field = spec::<AcceptanceFields>("emp_length");
        for raw in [json!("5 years"), json!("5"), json!("5.0"), json!(5), json!(5.7)] {
            assert_eq!(
                normalize(field, &raw).unwrap(),
                FieldValue::EmpLength(EmpLength::from_ordinal(5).unwrap()),
                "input {raw}"
            );
        }
        assert_eq!(
            normalize(field, &json!("< 1 year")).unwrap(),
            FieldValue::EmpLength(EmpLength::from_ordinal(0).unwrap())
        );
    }

    #[test]
    fn test_emp_length_out_of_range() {
        let field = spec::<AcceptanceFields>("emp_length");
        for raw in [json!("11"), json!("-1"), json!("ten"), json!(true)] {
            let err = normalize(field, &raw).unwrap_err();
            assert_eq!(err.field, "emp_length");
            assert!(err.message.contains("10+ years"));
        }
    }

    #[test]
    fn test_loan_amnt_minimum_boundary() {
        let field = spec::<AcceptanceFields>("loan_amnt");
        assert_eq!(normalize(field, &json!(1.0)).unwrap(), FieldValue::Number(1.0));

        let err = normalize(field, &json!(0.999999)).unwrap_err();
        assert_eq!(err.field, "loan_amnt");
        assert_eq!(err.received, "0.999999");
    }

    #[test]
    fn test_numeric_sentinel_and_strings() {
        let field = spec::<AcceptanceFields>("loan_amnt");
        assert_eq!(normalize(field, &json!("2500.5")).unwrap(), FieldValue::Number(2500.5));
        assert!(normalize(field, &json!(1e11)).is_err());
        assert!(normalize(field, &json!("lots")).is_err());
    }

    #[test]
    fn test_purpose_label_and_canonical() {
        let field = spec::<AcceptanceFields>("purpose");
        let from_label = normalize(field, &json!("debt_consolidation")).unwrap();
        let from_canonical = normalize(field, &json!("debt consolid")).unwrap();
        assert_eq!(from_label, from_canonical);
        assert!(normalize(field, &json!("boat")).is_err());
    }

    #[test]
    fn test_term_forms() {
        let field = spec::<GradeFields>("term");
        assert_eq!(normalize(field, &json!("60 months")).unwrap(), FieldValue::Term(Term::Months60));
        assert_eq!(normalize(field, &json!(36)).unwrap(), FieldValue::Term(Term::Months36));
        assert!(normalize(field, &json!(48)).is_err());
    }

    #[test]
    fn test_placeholders_only_for_joint_status() {
        let joint = spec::<GradeFields>("verification_status_joint");
        let single = spec::<GradeFields>("verification_status");
        assert!(normalize(joint, &json!("nan")).is_ok());
        assert!(normalize(single, &json!("nan")).is_err());
        assert!(normalize(single, &json!("Source Verified")).is_ok());
    }

    #[test]
    fn test_grade_membership() {
        let field = spec::<SubgradeFields>("grade");
        assert_eq!(normalize(field, &json!("B")).unwrap(), FieldValue::Grade(Grade::B));
        assert!(normalize(field, &json!("b")).is_err());
        assert!(normalize(field, &json!(1)).is_err());
    }
}
