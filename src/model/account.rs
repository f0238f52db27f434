use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::component::ComponentError;

/// Archetype of an account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccountType {
    #[serde(rename = "Normal User")]
    NormalUser,
    Business,
    Bot,
    Scammer,
    /// Built from manually entered metrics
    Custom,
}

impl AccountType {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            AccountType::NormalUser => "Normal User",
            AccountType::Business => "Business",
            AccountType::Bot => "Bot",
            AccountType::Scammer => "Scammer",
            AccountType::Custom => "Custom",
        }
    }

    /// Prefix of generated account ids
    pub fn id_prefix(&self) -> &'static str {
        match self {
            AccountType::NormalUser => "user",
            AccountType::Business => "biz",
            AccountType::Bot => "bot",
            AccountType::Scammer => "scam",
            AccountType::Custom => "custom",
        }
    }
}

impl Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Behavioural snapshot of one social media account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountProfile {
    pub account_id: String,
    pub account_type: AccountType,
    pub created_date: DateTime<Utc>,
    pub followers: u64,
    pub following: u64,
    pub posts: u64,
    pub posts_per_day: f64,
    pub bio_length: u32,
    pub has_profile_pic: bool,
    pub verified: bool,
    pub avg_likes_per_post: u32,
    pub messages_sent_per_day: u32,
    /// Share of posts that are near-duplicates, in percent
    pub repetitive_content: u8,
    /// Share of posts carrying suspicious links, in percent
    pub suspicious_links: u8,
    /// Connections to already flagged accounts
    pub network_flags: u32,
}

impl AccountProfile {
    /// Whole days between account creation and `now`
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_date).num_days()
    }

    /// Followers per followed account; `None` when following nobody
    pub fn follow_ratio(&self) -> Option<f64> {
        if self.following > 0 {
            Some(self.followers as f64 / self.following as f64)
        } else {
            None
        }
    }

    /// Reject profiles whose fields fall outside their domain
    pub fn validate(&self) -> Result<(), ComponentError> {
        if self.account_id.trim().is_empty() {
            return Err(ComponentError::ValidationError("Account ID must not be empty".to_string()));
        }
        if self.repetitive_content > 100 || self.suspicious_links > 100 {
            return Err(ComponentError::ValidationError(format!(
                "Percentages must be between 0 and 100 (account {})",
                self.account_id
            )));
        }
        if !self.posts_per_day.is_finite() || self.posts_per_day < 0.0 {
            return Err(ComponentError::ValidationError(format!(
                "Posts per day must be a non-negative number (account {})",
                self.account_id
            )));
        }
        Ok(())
    }
}
