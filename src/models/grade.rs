use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Grade
// ---------------------------------------------------------------------------

/// Loan grade. Declaration order is the class order of the grade model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

/// Index-to-label table for the grade model's probability vector.
pub const GRADES: [Grade; 7] = [
    Grade::A,
    Grade::B,
    Grade::C,
    Grade::D,
    Grade::E,
    Grade::F,
    Grade::G,
];

impl Grade {
    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        GRADES.get(ordinal).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
            Grade::G => "G",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        GRADES.iter().copied().find(|g| g.as_str() == s)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SubGrade
// ---------------------------------------------------------------------------

/// Number of subgrades per grade letter.
pub const LEVELS_PER_GRADE: usize = 5;

/// Number of subgrade classes (A1..G5).
pub const SUB_GRADE_COUNT: usize = GRADES.len() * LEVELS_PER_GRADE;

/// A grade letter refined by a level from 1 to 5, e.g. `B3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubGrade {
    grade: Grade,
    level: u8,
}

const SUB_GRADE_LABELS: [&str; SUB_GRADE_COUNT] = [
    "A1", "A2", "A3", "A4", "A5", "B1", "B2", "B3", "B4", "B5", "C1", "C2", "C3", "C4", "C5",
    "D1", "D2", "D3", "D4", "D5", "E1", "E2", "E3", "E4", "E5", "F1", "F2", "F3", "F4", "F5",
    "G1", "G2", "G3", "G4", "G5",
];

impl SubGrade {
    pub fn new(grade: Grade, level: u8) -> Option<Self> {
        if (1..=LEVELS_PER_GRADE as u8).contains(&level) {
            Some(Self { grade, level })
        } else {
            None
        }
    }

    pub fn grade(self) -> Grade {
        self.grade
    }

    pub fn level(self) -> u8 {
        self.level
    }

    /// Position in the subgrade model's class order (A1 = 0 .. G5 = 34).
    pub fn ordinal(self) -> usize {
        self.grade.ordinal() * LEVELS_PER_GRADE + (self.level as usize - 1)
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        let grade = Grade::from_ordinal(ordinal / LEVELS_PER_GRADE)?;
        Self::new(grade, (ordinal % LEVELS_PER_GRADE) as u8 + 1)
    }

    pub fn as_str(self) -> &'static str {
        SUB_GRADE_LABELS[self.ordinal()]
    }

    pub fn from_label(s: &str) -> Option<Self> {
        SUB_GRADE_LABELS
            .iter()
            .position(|label| *label == s)
            .and_then(Self::from_ordinal)
    }

    /// All subgrades in class order.
    pub fn all() -> impl Iterator<Item = SubGrade> {
        (0..SUB_GRADE_COUNT).filter_map(SubGrade::from_ordinal)
    }

    pub fn labels() -> &'static [&'static str] {
        &SUB_GRADE_LABELS
    }
}

impl fmt::Display for SubGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SubGrade {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_ordinals_follow_letters() {
        for (i, grade) in GRADES.iter().enumerate() {
            assert_eq!(grade.ordinal(), i);
            assert_eq!(Grade::from_ordinal(i), Some(*grade));
        }
        assert_eq!(Grade::from_ordinal(7), None);
    }

    #[test]
    fn test_subgrade_ordinal_roundtrip() {
        let all: Vec<SubGrade> = SubGrade::all().collect();
        assert_eq!(all.len(), 35);
        assert_eq!(all[0].as_str(), "A1");
        assert_eq!(all[34].as_str(), "G5");

        let b3 = SubGrade::from_label("B3").unwrap();
        assert_eq!(b3.grade(), Grade::B);
        assert_eq!(b3.level(), 3);
        assert_eq!(b3.ordinal(), 7);
    }

    #[test]
    fn test_subgrade_rejects_bad_level() {
        assert!(SubGrade::new(Grade::A, 0).is_none());
        assert!(SubGrade::new(Grade::A, 6).is_none());
        assert!(SubGrade::from_label("H1").is_none());
        assert!(SubGrade::from_label("b1").is_none());
    }
}
