//! Synthetic account generation.
//!
//! Generated accounts follow four archetypes whose metric ranges mimic what
//! moderation teams typically see: ordinary users, businesses (often flagged
//! by mistake), bots and scammers.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::component::ComponentError;
use crate::core::config::AccountMix;
use crate::model::{AccountProfile, AccountType};

const ARCHETYPES: [AccountType; 4] = [
    AccountType::NormalUser,
    AccountType::Business,
    AccountType::Bot,
    AccountType::Scammer,
];

/// Generate `count` accounts with archetypes drawn from `mix`
pub fn generate_mock_accounts<R: Rng + ?Sized>(
    count: usize,
    mix: &AccountMix,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<Vec<AccountProfile>, ComponentError> {
    let weights = [mix.normal, mix.business, mix.bot, mix.scammer];
    let chooser = WeightedIndex::new(weights)
        .map_err(|e| ComponentError::ConfigError(format!("Invalid account mix: {}", e)))?;

    let accounts = (0..count)
        .map(|index| {
            let archetype = ARCHETYPES[chooser.sample(&mut *rng)];
            generate_account(archetype, index, &mut *rng, now)
        })
        .collect();

    Ok(accounts)
}

/// Generate one account of the given archetype
pub fn generate_account<R: Rng + ?Sized>(
    archetype: AccountType,
    index: usize,
    rng: &mut R,
    now: DateTime<Utc>,
) -> AccountProfile {
    let ranges = ArchetypeRanges::for_type(archetype);

    let days_old = rng.gen_range(ranges.days_old.0..=ranges.days_old.1);
    let followers = rng.gen_range(ranges.followers.0..=ranges.followers.1);
    let following = rng.gen_range(ranges.following.0..=ranges.following.1);
    let posts = rng.gen_range(ranges.posts.0..=ranges.posts.1);

    let has_profile_pic = match archetype {
        AccountType::Bot => rng.gen_bool(0.5),
        _ => true,
    };
    let verified = match archetype {
        AccountType::NormalUser | AccountType::Business => rng.gen_bool(0.5),
        _ => false,
    };

    AccountProfile {
        account_id: format!("{}_{}", archetype.id_prefix(), index),
        account_type: archetype,
        created_date: now - Duration::days(days_old),
        followers,
        following,
        posts,
        posts_per_day: round2(posts as f64 / days_old as f64),
        bio_length: rng.gen_range(ranges.bio_length.0..=ranges.bio_length.1),
        has_profile_pic,
        verified,
        avg_likes_per_post: rng.gen_range(ranges.likes.0..=ranges.likes.1),
        messages_sent_per_day: rng.gen_range(ranges.messages.0..=ranges.messages.1),
        repetitive_content: rng.gen_range(ranges.repetitive.0..=ranges.repetitive.1),
        suspicious_links: rng.gen_range(ranges.links.0..=ranges.links.1),
        network_flags: rng.gen_range(ranges.network.0..=ranges.network.1),
    }
}

/// Inclusive metric ranges per archetype
struct ArchetypeRanges {
    days_old: (i64, i64),
    followers: (u64, u64),
    following: (u64, u64),
    posts: (u64, u64),
    bio_length: (u32, u32),
    likes: (u32, u32),
    messages: (u32, u32),
    repetitive: (u8, u8),
    links: (u8, u8),
    network: (u32, u32),
}

impl ArchetypeRanges {
    fn for_type(archetype: AccountType) -> Self {
        match archetype {
            AccountType::Business => Self {
                days_old: (30, 365),
                followers: (500, 10_000),
                following: (50, 300),
                posts: (100, 1000),
                bio_length: (100, 300),
                likes: (50, 500),
                messages: (5, 20),
                repetitive: (30, 50),
                links: (0, 10),
                network: (0, 0),
            },
            AccountType::Bot => Self {
                days_old: (1, 60),
                followers: (0, 100),
                following: (1000, 5000),
                posts: (100, 2000),
                bio_length: (0, 50),
                likes: (0, 5),
                messages: (20, 100),
                repetitive: (70, 95),
                links: (10, 50),
                network: (1, 5),
            },
            AccountType::Scammer => Self {
                days_old: (1, 90),
                followers: (100, 1000),
                following: (500, 2000),
                posts: (10, 200),
                bio_length: (50, 150),
                likes: (5, 30),
                messages: (30, 100),
                repetitive: (60, 85),
                links: (20, 80),
                network: (2, 8),
            },
            // normal users; custom accounts are never generated
            AccountType::NormalUser | AccountType::Custom => Self {
                days_old: (30, 1825),
                followers: (50, 2000),
                following: (100, 1500),
                posts: (20, 500),
                bio_length: (50, 200),
                likes: (10, 100),
                messages: (0, 10),
                repetitive: (0, 20),
                links: (0, 0),
                network: (0, 0),
            },
        }
    }
}

/// The three showcase accounts: a new coffee shop, an influencer and a scammer
pub fn demo_accounts(now: DateTime<Utc>) -> Vec<AccountProfile> {
    vec![
        AccountProfile {
            account_id: "demo_coffee_shop".to_string(),
            account_type: AccountType::Business,
            created_date: now - Duration::days(45),
            followers: 250,
            following: 150,
            posts: 60,
            posts_per_day: 1.33,
            bio_length: 180,
            has_profile_pic: true,
            verified: false,
            avg_likes_per_post: 45,
            messages_sent_per_day: 8,
            repetitive_content: 35,
            suspicious_links: 5,
            network_flags: 0,
        },
        AccountProfile {
            account_id: "demo_influencer".to_string(),
            account_type: AccountType::NormalUser,
            created_date: now - Duration::days(90),
            followers: 5000,
            following: 200,
            posts: 300,
            posts_per_day: 3.33,
            bio_length: 150,
            has_profile_pic: true,
            verified: false,
            avg_likes_per_post: 200,
            messages_sent_per_day: 15,
            repetitive_content: 40,
            suspicious_links: 15,
            network_flags: 1,
        },
        AccountProfile {
            account_id: "demo_scammer".to_string(),
            account_type: AccountType::Scammer,
            created_date: now - Duration::days(10),
            followers: 50,
            following: 3000,
            posts: 150,
            posts_per_day: 15.0,
            bio_length: 80,
            has_profile_pic: true,
            verified: false,
            avg_likes_per_post: 2,
            messages_sent_per_day: 80,
            repetitive_content: 85,
            suspicious_links: 60,
            network_flags: 5,
        },
    ]
}

/// Manually entered metrics for single-account analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CustomAccountInput {
    pub account_id: String,
    pub followers: u64,
    pub following: u64,
    pub posts: u64,
    pub account_age_days: i64,
    pub messages_sent_per_day: u32,
    pub repetitive_content: u8,
    pub suspicious_links: u8,
    pub network_flags: u32,
}

impl Default for CustomAccountInput {
    fn default() -> Self {
        Self {
            account_id: "custom_account_001".to_string(),
            followers: 500,
            following: 300,
            posts: 100,
            account_age_days: 180,
            messages_sent_per_day: 5,
            repetitive_content: 20,
            suspicious_links: 5,
            network_flags: 0,
        }
    }
}

impl CustomAccountInput {
    /// Posts per day derived from total posts and age
    pub fn posts_per_day(&self) -> f64 {
        if self.account_age_days > 0 {
            self.posts as f64 / self.account_age_days as f64
        } else {
            0.0
        }
    }

    pub fn validate(&self) -> Result<(), ComponentError> {
        if self.account_id.trim().is_empty() {
            return Err(ComponentError::ValidationError("Account ID must not be empty".to_string()));
        }
        if self.account_age_days < 1 {
            return Err(ComponentError::ValidationError(
                "Account age must be at least 1 day".to_string(),
            ));
        }
        if self.repetitive_content > 100 || self.suspicious_links > 100 {
            return Err(ComponentError::ValidationError(
                "Percentages must be between 0 and 100".to_string(),
            ));
        }
        Ok(())
    }
}

/// Build an account from manual input; profile fields not asked for are fixed
pub fn custom_account(input: &CustomAccountInput, now: DateTime<Utc>) -> Result<AccountProfile, ComponentError> {
    input.validate()?;

    Ok(AccountProfile {
        account_id: input.account_id.trim().to_string(),
        account_type: AccountType::Custom,
        created_date: now - Duration::days(input.account_age_days),
        followers: input.followers,
        following: input.following,
        posts: input.posts,
        posts_per_day: input.posts_per_day(),
        bio_length: 100,
        has_profile_pic: true,
        verified: false,
        avg_likes_per_post: 50,
        messages_sent_per_day: input.messages_sent_per_day,
        repetitive_content: input.repetitive_content,
        suspicious_links: input.suspicious_links,
        network_flags: input.network_flags,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
