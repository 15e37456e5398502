//! Typed client records and their categorical levels

use serde::{Deserialize, Serialize};

/// Number of monthly observations per client
pub const MONTHS: usize = 6;

/// Raw column layout expected from a dataset source, in positional order
pub const RAW_COLUMNS: [&str; 25] = [
    "ID",
    "LIMIT_BAL",
    "SEX",
    "EDUCATION",
    "MARRIAGE",
    "AGE",
    "PAY_0",
    "PAY_2",
    "PAY_3",
    "PAY_4",
    "PAY_5",
    "PAY_6",
    "BILL_AMT1",
    "BILL_AMT2",
    "BILL_AMT3",
    "BILL_AMT4",
    "BILL_AMT5",
    "BILL_AMT6",
    "PAY_AMT1",
    "PAY_AMT2",
    "PAY_AMT3",
    "PAY_AMT4",
    "PAY_AMT5",
    "PAY_AMT6",
    "default_next_month",
];

/// Name of the outcome column
pub const LABEL_COLUMN: &str = "default_next_month";

/// Repayment status columns, most recent month first
pub const REPAYMENT_COLUMNS: [&str; MONTHS] = ["PAY_0", "PAY_2", "PAY_3", "PAY_4", "PAY_5", "PAY_6"];

/// Bill statement columns, most recent month first
pub const BILL_COLUMNS: [&str; MONTHS] = [
    "BILL_AMT1", "BILL_AMT2", "BILL_AMT3", "BILL_AMT4", "BILL_AMT5", "BILL_AMT6",
];

/// Payment amount columns, most recent month first
pub const PAYMENT_COLUMNS: [&str; MONTHS] = [
    "PAY_AMT1", "PAY_AMT2", "PAY_AMT3", "PAY_AMT4", "PAY_AMT5", "PAY_AMT6",
];

/// Client sex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// All levels, in level-index order
    pub const LEVELS: [Sex; 2] = [Sex::Male, Sex::Female];

    /// Decode the source coding (1 = male, 2 = female)
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Sex::Male),
            2 => Some(Sex::Female),
            _ => None,
        }
    }

    /// Source code of this level
    pub fn code(self) -> i64 {
        match self {
            Sex::Male => 1,
            Sex::Female => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }

    pub fn level_index(self) -> usize {
        match self {
            Sex::Male => 0,
            Sex::Female => 1,
        }
    }
}

/// Highest education level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Education {
    GraduateSchool,
    University,
    HighSchool,
    Others,
    /// Codes 0, 5 and 6 are undocumented in the source and share one level
    Unknown,
}

impl Education {
    /// All levels, in level-index order
    pub const LEVELS: [Education; 5] = [
        Education::GraduateSchool,
        Education::University,
        Education::HighSchool,
        Education::Others,
        Education::Unknown,
    ];

    /// Decode the source coding (1 = graduate school, 2 = university,
    /// 3 = high school, 4 = others, 0/5/6 = unknown)
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Education::GraduateSchool),
            2 => Some(Education::University),
            3 => Some(Education::HighSchool),
            4 => Some(Education::Others),
            0 | 5 | 6 => Some(Education::Unknown),
            _ => None,
        }
    }

    /// Source code of this level; `Unknown` renders as 5
    pub fn code(self) -> i64 {
        match self {
            Education::GraduateSchool => 1,
            Education::University => 2,
            Education::HighSchool => 3,
            Education::Others => 4,
            Education::Unknown => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Education::GraduateSchool => "Graduate School",
            Education::University => "University",
            Education::HighSchool => "High School",
            Education::Others => "Others",
            Education::Unknown => "Unknown",
        }
    }

    pub fn level_index(self) -> usize {
        match self {
            Education::GraduateSchool => 0,
            Education::University => 1,
            Education::HighSchool => 2,
            Education::Others => 3,
            Education::Unknown => 4,
        }
    }
}

/// Marital status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaritalStatus {
    Married,
    Single,
    /// Code 3 plus the undocumented code 0
    Other,
}

impl MaritalStatus {
    /// All levels, in level-index order
    pub const LEVELS: [MaritalStatus; 3] = [
        MaritalStatus::Married,
        MaritalStatus::Single,
        MaritalStatus::Other,
    ];

    /// Decode the source coding (1 = married, 2 = single, 0/3 = other)
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(MaritalStatus::Married),
            2 => Some(MaritalStatus::Single),
            0 | 3 => Some(MaritalStatus::Other),
            _ => None,
        }
    }

    /// Source code of this level; `Other` renders as 3
    pub fn code(self) -> i64 {
        match self {
            MaritalStatus::Married => 1,
            MaritalStatus::Single => 2,
            MaritalStatus::Other => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MaritalStatus::Married => "Married",
            MaritalStatus::Single => "Single",
            MaritalStatus::Other => "Other",
        }
    }

    pub fn level_index(self) -> usize {
        match self {
            MaritalStatus::Married => 0,
            MaritalStatus::Single => 1,
            MaritalStatus::Other => 2,
        }
    }
}

/// Binary outcome: did the client default the following month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DefaultLabel {
    NoDefault,
    Default,
}

impl DefaultLabel {
    /// Decode the 0/1 outcome coding
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(DefaultLabel::NoDefault),
            1 => Some(DefaultLabel::Default),
            _ => None,
        }
    }

    pub fn from_bool(positive: bool) -> Self {
        if positive {
            DefaultLabel::Default
        } else {
            DefaultLabel::NoDefault
        }
    }

    pub fn code(self) -> i64 {
        match self {
            DefaultLabel::NoDefault => 0,
            DefaultLabel::Default => 1,
        }
    }

    pub fn is_positive(self) -> bool {
        self == DefaultLabel::Default
    }

    /// 0.0 / 1.0 target value used by the tree learners
    pub fn as_f64(self) -> f64 {
        self.code() as f64
    }
}

/// One client's attributes after cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditRecord {
    pub id: i64,
    /// Amount of given credit
    pub credit_limit: f64,
    pub sex: Sex,
    pub education: Education,
    pub marital_status: MaritalStatus,
    pub age: f64,
    /// Monthly repayment status codes, most recent month first
    pub repayment_status: [f64; MONTHS],
    /// Monthly bill statement amounts, most recent month first
    pub bill_amounts: [f64; MONTHS],
    /// Monthly payment amounts, most recent month first
    pub payment_amounts: [f64; MONTHS],
}
