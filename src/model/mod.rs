//! Account and assessment data model

pub mod account;
pub mod assessment;

pub use account::{AccountProfile, AccountType};
pub use assessment::{
    AssessedAccount, Explanation, RiskAssessment, RiskDistribution, RiskLevel, ScoreBin, Severity,
};
