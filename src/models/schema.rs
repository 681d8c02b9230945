//! Per-stage field schemas.
//!
//! Every stage's loan record is the same generic [`LoanRecord`](super::LoanRecord)
//! parameterized by a marker type implementing [`StageSchema`]. A schema is a
//! list of field groups (name, kind, default) plus the derived features the
//! stage's model was trained with.

use serde::Serialize;
use std::fmt;

use super::fields::{
    ApplicationType, EmpLength, HomeOwnership, JointVerification, Purpose, Term,
    VerificationStatus, EMP_LENGTH_LABELS,
};
use super::grade::SubGrade;
use super::loan::FieldValue;

/// Upper sentinel for numeric fields; effectively unbounded.
pub const NUMERIC_SENTINEL: f64 = 1e10;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Acceptance,
    Grade,
    Subgrade,
    InterestRate,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Acceptance,
        Stage::Grade,
        Stage::Subgrade,
        Stage::InterestRate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Acceptance => "acceptance",
            Stage::Grade => "grade",
            Stage::Subgrade => "subgrade",
            Stage::InterestRate => "interest_rate",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|stage| stage.as_str() == s)
    }

    /// Field schema of this stage, as (field, derived) tables.
    pub fn schema(&self) -> (Vec<&'static FieldSpec>, &'static [Derived]) {
        match self {
            Stage::Acceptance => (AcceptanceFields::fields().collect(), AcceptanceFields::DERIVED),
            Stage::Grade => (GradeFields::fields().collect(), GradeFields::DERIVED),
            Stage::Subgrade => (SubgradeFields::fields().collect(), SubgradeFields::DERIVED),
            Stage::InterestRate => (
                InterestRateFields::fields().collect(),
                InterestRateFields::DERIVED,
            ),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Field specs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Numeric { min: f64, max: f64 },
    EmpLength,
    Purpose,
    Term,
    Verification,
    JointVerification,
    HomeOwnership,
    ApplicationType,
    Grade,
    SubGrade,
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Numeric { .. } => "number",
            FieldKind::EmpLength => "emp_length",
            FieldKind::Purpose => "purpose",
            FieldKind::Term => "term",
            FieldKind::Verification => "verification_status",
            FieldKind::JointVerification => "verification_status_joint",
            FieldKind::HomeOwnership => "home_ownership",
            FieldKind::ApplicationType => "application_type",
            FieldKind::Grade => "grade",
            FieldKind::SubGrade => "sub_grade",
        }
    }

    /// Human-facing labels a categorical field accepts. Empty for numerics.
    pub fn accepted_labels(&self) -> Vec<&'static str> {
        match self {
            FieldKind::Numeric { .. } => Vec::new(),
            FieldKind::EmpLength => EMP_LENGTH_LABELS.to_vec(),
            FieldKind::Purpose => Purpose::ALL.iter().map(|p| p.label()).collect(),
            FieldKind::Term => Term::LABELS.to_vec(),
            FieldKind::Verification => VerificationStatus::ALL.iter().map(|v| v.label()).collect(),
            FieldKind::JointVerification => VerificationStatus::ALL
                .iter()
                .map(|v| v.label())
                .chain(JointVerification::PLACEHOLDERS)
                .collect(),
            FieldKind::HomeOwnership => HomeOwnership::ALL.iter().map(|h| h.label()).collect(),
            FieldKind::ApplicationType => ApplicationType::ALL.iter().map(|a| a.label()).collect(),
            FieldKind::Grade => super::grade::GRADES.iter().map(|g| g.as_str()).collect(),
            FieldKind::SubGrade => SubGrade::labels().to_vec(),
        }
    }
}

/// What happens when a field is absent from the submitted record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Requirement {
    Default(FieldValue),
    /// Must be produced by an earlier stage and supplied by the caller.
    Dependency { hint: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub requirement: Requirement,
}

const fn numeric(name: &'static str, min: f64, default: f64) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Numeric {
            min,
            max: NUMERIC_SENTINEL,
        },
        requirement: Requirement::Default(FieldValue::Number(default)),
    }
}

const fn categorical(name: &'static str, kind: FieldKind, default: FieldValue) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        requirement: Requirement::Default(default),
    }
}

const fn dependency(name: &'static str, kind: FieldKind, hint: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        requirement: Requirement::Dependency { hint },
    }
}

// ---------------------------------------------------------------------------
// Derived features
// ---------------------------------------------------------------------------

/// Features computed from stored fields when a record is turned into model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Derived {
    FicoAverage,
    FicoRange,
    SecAppFicoAverage,
    SecAppFicoRange,
    LoanToIncome,
    LoanSizeBucket,
    DtiBucket,
}

impl Derived {
    pub fn column(&self) -> &'static str {
        match self {
            Derived::FicoAverage => "fico_avg",
            Derived::FicoRange => "fico_range",
            Derived::SecAppFicoAverage => "sec_app_fico_avg",
            Derived::SecAppFicoRange => "sec_app_fico_range",
            Derived::LoanToIncome => "loan_to_income",
            Derived::LoanSizeBucket => "loan_amnt_bucket",
            Derived::DtiBucket => "dti_bucket",
        }
    }
}

// ---------------------------------------------------------------------------
// Field groups
// ---------------------------------------------------------------------------

const APPLICATION: &[FieldSpec] = &[
    numeric("loan_amnt", 1.0, 2500.0),
    numeric("dti", 0.0, 0.308),
    categorical("emp_length", FieldKind::EmpLength, FieldValue::EmpLength(EmpLength::DEFAULT)),
    categorical("purpose", FieldKind::Purpose, FieldValue::Purpose(Purpose::Other)),
];

const CREDIT_PROFILE: &[FieldSpec] = &[
    numeric("open_acc", 0.0, 4.0),
    numeric("loan_amnt", 1.0, 5000.0),
    numeric("sec_app_fico_range_low", 1.0, 565.0),
    numeric("annual_inc_joint", 1.0, 77500.0),
    numeric("mo_sin_old_rev_tl_op", 0.0, 100.0),
    numeric("bc_util", 0.0, 13.4),
    numeric("total_rev_hi_lim", 1.0, 8700.0),
    numeric("tot_hi_cred_lim", 1.0, 35519.0),
    categorical("term", FieldKind::Term, FieldValue::Term(Term::Months36)),
    numeric("inq_last_12m", 0.0, 1.0),
    categorical(
        "verification_status_joint",
        FieldKind::JointVerification,
        FieldValue::JointVerification(JointVerification::Status(VerificationStatus::NotVerified)),
    ),
    categorical("purpose", FieldKind::Purpose, FieldValue::Purpose(Purpose::DebtConsolidation)),
    numeric("total_bc_limit", 1.0, 7200.0),
    numeric("fico_range_low", 1.0, 715.0),
    numeric("open_rv_24m", 0.0, 4.0),
    numeric("mo_sin_rcnt_rev_tl_op", 0.0, 1.0),
    numeric("num_bc_sats", 0.0, 2.0),
    numeric("all_util", 0.0, 78.0),
    numeric("sec_app_fico_range_high", 1.0, 569.0),
    numeric("num_tl_op_past_12m", 0.0, 2.0),
    numeric("acc_open_past_24mths", 0.0, 5.0),
    numeric("bc_open_to_buy", 0.0, 6233.0),
    categorical(
        "verification_status",
        FieldKind::Verification,
        FieldValue::Verification(VerificationStatus::NotVerified),
    ),
    numeric("sec_app_open_acc", 0.0, 7.0),
    numeric("pct_tl_nvr_dlq", 0.0, 83.3),
    numeric("fico_range_high", 1.0, 719.0),
    numeric("num_actv_rev_tl", 0.0, 2.0),
    numeric("open_rv_12m", 0.0, 1.0),
    numeric("percent_bc_gt_75", 0.0, 0.0),
    numeric("mo_sin_rcnt_tl", 0.0, 1.0),
    numeric("inq_fi", 0.0, 0.0),
    numeric("annual_inc", 1.0, 33000.0),
];

const BORROWER_PROFILE: &[FieldSpec] = &[
    numeric("dti", 0.0, 18.0),
    categorical("emp_length", FieldKind::EmpLength, FieldValue::EmpLength(EmpLength::DEFAULT)),
    categorical(
        "home_ownership",
        FieldKind::HomeOwnership,
        FieldValue::HomeOwnership(HomeOwnership::Mortgage),
    ),
    categorical(
        "application_type",
        FieldKind::ApplicationType,
        FieldValue::ApplicationType(ApplicationType::Individual),
    ),
];

const GRADE_DEPENDENCY: &[FieldSpec] = &[dependency(
    "grade",
    FieldKind::Grade,
    "predict it with the grade stage first",
)];

const SUB_GRADE_DEPENDENCY: &[FieldSpec] = &[dependency(
    "sub_grade",
    FieldKind::SubGrade,
    "predict it with the subgrade stage first",
)];

const APPLICANT_DERIVED: &[Derived] = &[
    Derived::FicoAverage,
    Derived::FicoRange,
    Derived::SecAppFicoAverage,
    Derived::SecAppFicoRange,
    Derived::LoanToIncome,
];

const FULL_DERIVED: &[Derived] = &[
    Derived::FicoAverage,
    Derived::FicoRange,
    Derived::SecAppFicoAverage,
    Derived::SecAppFicoRange,
    Derived::LoanToIncome,
    Derived::LoanSizeBucket,
    Derived::DtiBucket,
];

// ---------------------------------------------------------------------------
// Stage schemas
// ---------------------------------------------------------------------------

pub trait StageSchema: fmt::Debug + Clone + Send + Sync + 'static {
    const STAGE: Stage;
    /// Field groups, concatenated in order to form the record layout.
    const GROUPS: &'static [&'static [FieldSpec]];
    const DERIVED: &'static [Derived];

    fn fields() -> impl Iterator<Item = &'static FieldSpec> {
        Self::GROUPS.iter().flat_map(|group| group.iter())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AcceptanceFields;

impl StageSchema for AcceptanceFields {
    const STAGE: Stage = Stage::Acceptance;
    const GROUPS: &'static [&'static [FieldSpec]] = &[APPLICATION];
    const DERIVED: &'static [Derived] = &[];
}

#[derive(Debug, Clone, Copy)]
pub struct GradeFields;

impl StageSchema for GradeFields {
    const STAGE: Stage = Stage::Grade;
    const GROUPS: &'static [&'static [FieldSpec]] = &[CREDIT_PROFILE];
    const DERIVED: &'static [Derived] = APPLICANT_DERIVED;
}

#[derive(Debug, Clone, Copy)]
pub struct SubgradeFields;

impl StageSchema for SubgradeFields {
    const STAGE: Stage = Stage::Subgrade;
    const GROUPS: &'static [&'static [FieldSpec]] =
        &[CREDIT_PROFILE, BORROWER_PROFILE, GRADE_DEPENDENCY];
    const DERIVED: &'static [Derived] = FULL_DERIVED;
}

#[derive(Debug, Clone, Copy)]
pub struct InterestRateFields;

impl StageSchema for InterestRateFields {
    const STAGE: Stage = Stage::InterestRate;
    const GROUPS: &'static [&'static [FieldSpec]] = &[
        CREDIT_PROFILE,
        BORROWER_PROFILE,
        GRADE_DEPENDENCY,
        SUB_GRADE_DEPENDENCY,
    ];
    const DERIVED: &'static [Derived] = FULL_DERIVED;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_unique_names<S: StageSchema>() {
        let mut seen = HashSet::new();
        for field in S::fields() {
            assert!(seen.insert(field.name), "duplicate field {}", field.name);
        }
    }

    #[test]
    fn test_field_names_unique_per_stage() {
        assert_unique_names::<AcceptanceFields>();
        assert_unique_names::<GradeFields>();
        assert_unique_names::<SubgradeFields>();
        assert_unique_names::<InterestRateFields>();
    }

    #[test]
    fn test_defaults_satisfy_minimums() {
        for stage in Stage::ALL {
            for field in stage.schema().0 {
                if let (FieldKind::Numeric { min, max }, Requirement::Default(FieldValue::Number(v))) =
                    (field.kind, field.requirement)
                {
                    assert!(v >= min && v <= max, "{} default {} out of range", field.name, v);
                }
            }
        }
    }

    #[test]
    fn test_subgrade_stage_requires_grade() {
        let grade = SubgradeFields::fields()
            .find(|f| f.name == "grade")
            .expect("grade field");
        assert!(matches!(grade.requirement, Requirement::Dependency { .. }));
        assert!(GradeFields::fields().all(|f| f.name != "grade"));
    }

    #[test]
    fn test_stage_names_roundtrip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_str(stage.as_str()), Some(stage));
        }
        assert_eq!(Stage::from_str("step5"), None);
    }
}
