use serde::Serialize;

// ---------------------------------------------------------------------------
// Employment length
// ---------------------------------------------------------------------------

/// Employment length bucket, stored as its ordinal (0 = "< 1 year", 10 = "10+ years").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct EmpLength(u8);

pub const EMP_LENGTH_LABELS: [&str; 11] = [
    "< 1 year",
    "1 year",
    "2 years",
    "3 years",
    "4 years",
    "5 years",
    "6 years",
    "7 years",
    "8 years",
    "9 years",
    "10+ years",
];

impl EmpLength {
    pub const MAX: u8 = 10;
    pub const DEFAULT: EmpLength = EmpLength(5);

    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        if (0..=Self::MAX as i64).contains(&ordinal) {
            Some(Self(ordinal as u8))
        } else {
            None
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        EMP_LENGTH_LABELS
            .iter()
            .position(|l| *l == label)
            .map(|i| Self(i as u8))
    }

    pub fn ordinal(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        EMP_LENGTH_LABELS[self.0 as usize]
    }
}

// ---------------------------------------------------------------------------
// Purpose
// ---------------------------------------------------------------------------

/// Loan purpose. The canonical form is the stemmed abbreviation the models were trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    DebtConsolidation,
    SmallBusiness,
    HomeImprovement,
    MajorPurchase,
    CreditCard,
    Other,
    House,
    Vacation,
    Car,
    Medical,
    Moving,
    RenewableEnergy,
    Wedding,
    Educational,
}

impl Purpose {
    pub const ALL: [Purpose; 14] = [
        Purpose::DebtConsolidation,
        Purpose::SmallBusiness,
        Purpose::HomeImprovement,
        Purpose::MajorPurchase,
        Purpose::CreditCard,
        Purpose::Other,
        Purpose::House,
        Purpose::Vacation,
        Purpose::Car,
        Purpose::Medical,
        Purpose::Moving,
        Purpose::RenewableEnergy,
        Purpose::Wedding,
        Purpose::Educational,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Purpose::DebtConsolidation => "debt_consolidation",
            Purpose::SmallBusiness => "small_business",
            Purpose::HomeImprovement => "home_improvement",
            Purpose::MajorPurchase => "major_purchase",
            Purpose::CreditCard => "credit_card",
            Purpose::Other => "other",
            Purpose::House => "house",
            Purpose::Vacation => "vacation",
            Purpose::Car => "car",
            Purpose::Medical => "medical",
            Purpose::Moving => "moving",
            Purpose::RenewableEnergy => "renewable_energy",
            Purpose::Wedding => "wedding",
            Purpose::Educational => "educational",
        }
    }

    pub fn canonical(self) -> &'static str {
        match self {
            Purpose::DebtConsolidation => "debt consolid",
            Purpose::SmallBusiness => "small busi",
            Purpose::HomeImprovement => "home improv",
            Purpose::MajorPurchase => "major purchas",
            Purpose::CreditCard => "credit card",
            Purpose::Other => "other",
            Purpose::House => "hous",
            Purpose::Vacation => "vacat",
            Purpose::Car => "car",
            Purpose::Medical => "medic",
            Purpose::Moving => "move",
            Purpose::RenewableEnergy => "renew energi",
            Purpose::Wedding => "wed",
            Purpose::Educational => "educ",
        }
    }

    /// Accepts the human label or the canonical abbreviation.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.label() == s || p.canonical() == s)
    }
}

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Months36,
    Months60,
}

impl Term {
    pub const LABELS: [&'static str; 2] = ["36 months", "60 months"];

    pub fn months(self) -> u32 {
        match self {
            Term::Months36 => 36,
            Term::Months60 => 60,
        }
    }

    pub fn from_months(months: i64) -> Option<Self> {
        match months {
            36 => Some(Term::Months36),
            60 => Some(Term::Months60),
            _ => None,
        }
    }

    /// Accepts "36 months" / "60 months" or the bare month count.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "36 months" => Some(Term::Months36),
            "60 months" => Some(Term::Months60),
            other => other.parse::<i64>().ok().and_then(Self::from_months),
        }
    }
}

// ---------------------------------------------------------------------------
// Verification status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    NotVerified,
    SourceVerified,
    Verified,
}

impl VerificationStatus {
    pub const ALL: [VerificationStatus; 3] = [
        VerificationStatus::NotVerified,
        VerificationStatus::SourceVerified,
        VerificationStatus::Verified,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VerificationStatus::NotVerified => "Not Verified",
            VerificationStatus::SourceVerified => "Source Verified",
            VerificationStatus::Verified => "Verified",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.label() == s)
    }
}

/// Verification status of the joint applicant; individual applications carry a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointVerification {
    Status(VerificationStatus),
    NotApplicable,
}

impl JointVerification {
    pub const PLACEHOLDERS: [&'static str; 2] = ["missing", "nan"];

    pub fn canonical(self) -> &'static str {
        match self {
            JointVerification::Status(status) => status.label(),
            JointVerification::NotApplicable => "missing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        if Self::PLACEHOLDERS.contains(&s) {
            return Some(JointVerification::NotApplicable);
        }
        VerificationStatus::parse(s).map(JointVerification::Status)
    }
}

// ---------------------------------------------------------------------------
// Home ownership
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeOwnership {
    Mortgage,
    Rent,
    Own,
    Any,
    Other,
    None,
}

impl HomeOwnership {
    pub const ALL: [HomeOwnership; 6] = [
        HomeOwnership::Mortgage,
        HomeOwnership::Rent,
        HomeOwnership::Own,
        HomeOwnership::Any,
        HomeOwnership::Other,
        HomeOwnership::None,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HomeOwnership::Mortgage => "MORTGAGE",
            HomeOwnership::Rent => "RENT",
            HomeOwnership::Own => "OWN",
            HomeOwnership::Any => "ANY",
            HomeOwnership::Other => "OTHER",
            HomeOwnership::None => "NONE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|h| h.label() == s)
    }
}

// ---------------------------------------------------------------------------
// Application type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationType {
    Individual,
    Joint,
}

impl ApplicationType {
    pub const ALL: [ApplicationType; 2] = [ApplicationType::Individual, ApplicationType::Joint];

    pub fn label(self) -> &'static str {
        match self {
            ApplicationType::Individual => "Individual",
            ApplicationType::Joint => "Joint App",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.label() == s)
    }
}

// ---------------------------------------------------------------------------
// Derived buckets
// ---------------------------------------------------------------------------

/// Loan size bucket derived from `loan_amnt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanSizeBucket {
    Under5K,
    From5KTo10K,
    From10KTo20K,
    From20KTo30K,
    From30KTo40K,
    AtLeast40K,
}

impl LoanSizeBucket {
    pub fn from_amount(amount: f64) -> Self {
        if amount < 5_000.0 {
            LoanSizeBucket::Under5K
        } else if amount < 10_000.0 {
            LoanSizeBucket::From5KTo10K
        } else if amount < 20_000.0 {
            LoanSizeBucket::From10KTo20K
        } else if amount < 30_000.0 {
            LoanSizeBucket::From20KTo30K
        } else if amount < 40_000.0 {
            LoanSizeBucket::From30KTo40K
        } else {
            LoanSizeBucket::AtLeast40K
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LoanSizeBucket::Under5K => "<5K",
            LoanSizeBucket::From5KTo10K => "5K-10K",
            LoanSizeBucket::From10KTo20K => "10K-20K",
            LoanSizeBucket::From20KTo30K => "20K-30K",
            LoanSizeBucket::From30KTo40K => "30K-40K",
            LoanSizeBucket::AtLeast40K => ">=40K",
        }
    }
}

/// Debt-to-income bucket; `dti` is expressed in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtiBucket {
    Low,
    Medium,
    High,
}

impl DtiBucket {
    pub fn from_dti(dti: f64) -> Self {
        if dti < 15.0 {
            DtiBucket::Low
        } else if dti <= 25.0 {
            DtiBucket::Medium
        } else {
            DtiBucket::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DtiBucket::Low => "<15%",
            DtiBucket::Medium => "15-25%",
            DtiBucket::High => ">25%",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
