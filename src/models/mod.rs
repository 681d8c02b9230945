pub mod fields;
pub mod grade;
pub mod loan;
pub mod prediction;
pub mod schema;

pub use fields::{
    ApplicationType, DtiBucket, EmpLength, HomeOwnership, JointVerification, LoanSizeBucket,
    Purpose, Term, VerificationStatus,
};
pub use grade::{Grade, SubGrade, GRADES};
pub use loan::{FieldError, FieldValue, LoanRecord, RecordError};
pub use prediction::{
    AcceptanceResult, Decision, GradeCategory, GradeResult, InterestRateResult, SubgradeRange,
    SubgradeResult, ACCEPTED_REJECTED,
};
pub use schema::{
    AcceptanceFields, GradeFields, InterestRateFields, Stage, StageSchema, SubgradeFields,
};
