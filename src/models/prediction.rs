use serde::{Serialize, Serializer};
use std::fmt;

use super::grade::{Grade, SubGrade};

// ---------------------------------------------------------------------------
// Stage 1: acceptance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Accepted,
    Rejected,
}

/// Index-to-label table for the acceptance model's probability vector.
pub const ACCEPTED_REJECTED: [Decision; 2] = [Decision::Rejected, Decision::Accepted];

impl Decision {
    /// Class label as persisted alongside the trained model.
    pub fn class_label(&self) -> &'static str {
        match self {
            Decision::Accepted => "Accepted",
            Decision::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AcceptanceResult {
    pub decision: Decision,
    pub accepted_probability: f64,
    pub rejected_probability: f64,
}

// ---------------------------------------------------------------------------
// Stage 2: grade
// ---------------------------------------------------------------------------

/// A single grade, or an alphabetically ordered two-grade range when the model is unsure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeCategory {
    Single(Grade),
    Range(Grade, Grade),
}

impl GradeCategory {
    /// Builds a range with its bounds in alphabetical order.
    pub fn range(a: Grade, b: Grade) -> Self {
        if a <= b {
            GradeCategory::Range(a, b)
        } else {
            GradeCategory::Range(b, a)
        }
    }
}

impl fmt::Display for GradeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeCategory::Single(g) => write!(f, "{g}"),
            GradeCategory::Range(low, high) => write!(f, "{low}-{high}"),
        }
    }
}

impl Serialize for GradeCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GradeResult {
    pub grade_category: GradeCategory,
    pub predicted_grade: Grade,
}

// ---------------------------------------------------------------------------
// Stage 3: subgrade
// ---------------------------------------------------------------------------

/// Two subgrades of one grade, lower level first, e.g. `B1-B3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubgradeRange {
    pub low: SubGrade,
    pub high: SubGrade,
}

impl SubgradeRange {
    pub fn new(a: SubGrade, b: SubGrade) -> Self {
        if a.ordinal() <= b.ordinal() {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }
}

impl fmt::Display for SubgradeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

impl Serialize for SubgradeRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubgradeResult {
    pub subgrade_category: SubgradeRange,
    pub predicted_subgrade: SubGrade,
}

// ---------------------------------------------------------------------------
// Stage 4: interest rate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InterestRateResult {
    pub interest_rate: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grade_category_serializes_as_string() {
        let result = GradeResult {
            grade_category: GradeCategory::range(Grade::B, Grade::A),
            predicted_grade: Grade::B,
        };
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            json!({ "grade_category": "A-B", "predicted_grade": "B" })
        );
    }

    #[test]
    fn test_subgrade_range_orders_by_level() {
        let b1 = SubGrade::from_label("B1").unwrap();
        let b3 = SubGrade::from_label("B3").unwrap();
        assert_eq!(SubgradeRange::new(b3, b1).to_string(), "B1-B3");
    }

    #[test]
    fn test_decision_serializes_uppercase() {
        let result = AcceptanceResult {
            decision: Decision::Accepted,
            accepted_probability: 0.75,
            rejected_probability: 0.25,
        };
        let value = serde_json::to_value(result).unwrap();
        assert_eq!(value["decision"], "ACCEPTED");
        assert_eq!(ACCEPTED_REJECTED[1].class_label(), "Accepted");
    }
}
