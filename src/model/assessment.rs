use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::account::AccountProfile;

/// How strongly an explanation points towards (or away from) abuse
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
    Positive,
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Critical => "🚩",
            Severity::Warning => "⚠️",
            Severity::Info => "ℹ️",
            Severity::Positive => "✅",
        }
    }
}

/// One human-readable reason behind a score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Explanation {
    pub severity: Severity,
    pub message: String,
}

impl Explanation {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

impl Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.severity.icon(), self.message)
    }
}

/// Banding of a risk score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiskLevel {
    #[serde(rename = "LOW RISK")]
    Low,
    #[serde(rename = "MODERATE RISK")]
    Moderate,
    #[serde(rename = "HIGH RISK")]
    High,
}

impl RiskLevel {
    /// Every level, lowest first
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Moderate, RiskLevel::High];

    /// Score at or above which an account is high risk
    pub const HIGH_THRESHOLD: u8 = 70;
    /// Score at or above which an account is moderate risk
    pub const MODERATE_THRESHOLD: u8 = 40;

    pub fn from_score(score: u8) -> Self {
        if score >= Self::HIGH_THRESHOLD {
            RiskLevel::High
        } else if score >= Self::MODERATE_THRESHOLD {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW RISK",
            RiskLevel::Moderate => "MODERATE RISK",
            RiskLevel::High => "HIGH RISK",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Moderate => "🟡",
            RiskLevel::High => "🔴",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Activity appears normal. Account likely legitimate.",
            RiskLevel::Moderate => "Unusual patterns detected. May be legitimate but warrants human review.",
            RiskLevel::High => {
                "Strong indicators of malicious activity. Recommend immediate review and possible restriction."
            }
        }
    }

    /// CSS class used by account cards
    pub fn css_class(&self) -> &'static str {
        match self {
            RiskLevel::Low => "risk-low",
            RiskLevel::Moderate => "risk-moderate",
            RiskLevel::High => "risk-high",
        }
    }

    /// Chart colour as RGB
    pub fn color_rgb(&self) -> (u8, u8, u8) {
        match self {
            RiskLevel::Low => (0x4c, 0xaf, 0x50),
            RiskLevel::Moderate => (0xff, 0x98, 0x00),
            RiskLevel::High => (0xf4, 0x43, 0x36),
        }
    }

    /// Short lowercase name used in query strings and metric labels
    pub fn metric_label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

impl Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    /// Accepts `low`, `Low`, `LOW RISK` and the like
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let word = normalized.strip_suffix(" risk").unwrap_or(&normalized);
        match word {
            "low" => Ok(RiskLevel::Low),
            "moderate" => Ok(RiskLevel::Moderate),
            "high" => Ok(RiskLevel::High),
            _ => Err(format!("Unknown risk level: '{}'", s)),
        }
    }
}

/// Outcome of scoring one account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub account_id: String,
    /// 0..=100
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub recommendation: String,
    pub explanations: Vec<Explanation>,
    pub assessed_at: DateTime<Utc>,
}

/// Account profile together with its assessment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssessedAccount {
    pub account: AccountProfile,
    pub assessment: RiskAssessment,
}

/// Counts of accounts per risk level
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RiskDistribution {
    pub high_risk: u64,
    pub moderate_risk: u64,
    pub low_risk: u64,
    pub total: u64,
    /// Mean score; 0.0 when there are no accounts
    pub avg_score: f64,
}

impl RiskDistribution {
    pub fn count(&self, level: RiskLevel) -> u64 {
        match level {
            RiskLevel::Low => self.low_risk,
            RiskLevel::Moderate => self.moderate_risk,
            RiskLevel::High => self.high_risk,
        }
    }
}

/// One histogram bin of risk scores, `[lower, upper)` except the last bin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(39), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(69), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::High);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("low".parse::<RiskLevel>(), Ok(RiskLevel::Low));
        assert_eq!("MODERATE RISK".parse::<RiskLevel>(), Ok(RiskLevel::Moderate));
        assert_eq!(" High ".parse::<RiskLevel>(), Ok(RiskLevel::High));
        assert!("severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_explanation_display() {
        let explanation = Explanation::new(Severity::Positive, "Verified account");
        assert_eq!(explanation.to_string(), "✅ Verified account");
    }

    #[test]
    fn test_level_serializes_as_label() {
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"HIGH RISK\"");
    }
}
