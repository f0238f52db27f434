//! Rule-based risk scoring.
//!
//! Seven behavioural factors each contribute a bounded number of points
//! (15 + 20 + 20 + 15 + 15 + 10 + 5 = 100). Within a factor the first
//! matching band wins. Scores band into risk levels at 40 and 70.

use chrono::{DateTime, Utc};

use crate::model::{
    AccountProfile, AssessedAccount, Explanation, RiskAssessment, RiskDistribution, RiskLevel,
    ScoreBin, Severity,
};

/// Highest possible score
pub const MAX_SCORE: u8 = 100;

/// Points and reason produced by one factor
type FactorHit = (u8, Explanation);

type Factor = fn(&AccountProfile, i64) -> Option<FactorHit>;

const FACTORS: [Factor; 7] = [
    account_age,
    follow_pattern,
    posting_frequency,
    content_repetition,
    messaging_volume,
    suspicious_links,
    network_connections,
];

/// Score one account as of `now`
pub fn calculate_risk_score(account: &AccountProfile, now: DateTime<Utc>) -> RiskAssessment {
    let age_days = account.age_days(now);

    let mut score: u32 = 0;
    let mut explanations = Vec::new();
    for factor in FACTORS {
        if let Some((points, explanation)) = factor(account, age_days) {
            score += u32::from(points);
            explanations.push(explanation);
        }
    }

    let risk_score = score.min(u32::from(MAX_SCORE)) as u8;
    let risk_level = RiskLevel::from_score(risk_score);

    if risk_level == RiskLevel::Low {
        explanations.extend(positive_signals(account, age_days));
    }

    RiskAssessment {
        account_id: account.account_id.clone(),
        risk_score,
        risk_level,
        recommendation: risk_level.recommendation().to_string(),
        explanations,
        assessed_at: now,
    }
}

/// Score every account, preserving input order
pub fn analyze_batch(accounts: Vec<AccountProfile>, now: DateTime<Utc>) -> Vec<AssessedAccount> {
    accounts
        .into_iter()
        .map(|account| {
            let assessment = calculate_risk_score(&account, now);
            AssessedAccount { account, assessment }
        })
        .collect()
}

/// Count accounts per level and average their scores
pub fn risk_distribution<'a, I>(assessments: I) -> RiskDistribution
where
    I: IntoIterator<Item = &'a RiskAssessment>,
{
    let mut distribution = RiskDistribution::default();
    let mut score_sum: u64 = 0;

    for assessment in assessments {
        match assessment.risk_level {
            RiskLevel::High => distribution.high_risk += 1,
            RiskLevel::Moderate => distribution.moderate_risk += 1,
            RiskLevel::Low => distribution.low_risk += 1,
        }
        distribution.total += 1;
        score_sum += u64::from(assessment.risk_score);
    }

    if distribution.total > 0 {
        distribution.avg_score = score_sum as f64 / distribution.total as f64;
    }
    distribution
}

/// Bucket scores into `bins` equal-width bins spanning 0..=100
pub fn score_histogram<'a, I>(assessments: I, bins: usize) -> Vec<ScoreBin>
where
    I: IntoIterator<Item = &'a RiskAssessment>,
{
    let bins = bins.max(1);
    let width = f64::from(MAX_SCORE) / bins as f64;

    let mut histogram: Vec<ScoreBin> = (0..bins)
        .map(|i| ScoreBin {
            lower: i as f64 * width,
            upper: (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    for assessment in assessments {
        // the top score lands in the last bin
        let index = ((f64::from(assessment.risk_score) / width) as usize).min(bins - 1);
        histogram[index].count += 1;
    }

    histogram
}

fn account_age(_account: &AccountProfile, age_days: i64) -> Option<FactorHit> {
    if age_days < 30 {
        Some((15, Explanation::new(Severity::Critical, "Very new account (less than 1 month old)")))
    } else if age_days < 90 {
        Some((8, Explanation::new(Severity::Warning, "Relatively new account (less than 3 months)")))
    } else if age_days < 180 {
        Some((3, Explanation::new(Severity::Info, "Account is less than 6 months old")))
    } else {
        None
    }
}

fn follow_pattern(account: &AccountProfile, _age_days: i64) -> Option<FactorHit> {
    let ratio = account.follow_ratio()?;

    if account.following > 2000 && account.followers < 100 {
        Some((
            20,
            Explanation::new(
                Severity::Critical,
                "Suspicious follow pattern: Following many, very few followers (bot-like)",
            ),
        ))
    } else if ratio < 0.1 {
        Some((
            12,
            Explanation::new(
                Severity::Warning,
                "Low follower-to-following ratio (potential spam behavior)",
            ),
        ))
    } else if ratio > 10.0 && account.followers > 5000 {
        Some((
            0,
            Explanation::new(
                Severity::Positive,
                "High influence: Many followers, selective following (typical influencer/business)",
            ),
        ))
    } else {
        None
    }
}

fn posting_frequency(account: &AccountProfile, _age_days: i64) -> Option<FactorHit> {
    let rate = account.posts_per_day;

    if rate > 10.0 {
        Some((
            20,
            Explanation::new(
                Severity::Critical,
                format!("Extremely high posting frequency ({:.1} posts/day - likely automated)", rate),
            ),
        ))
    } else if rate > 5.0 {
        Some((
            12,
            Explanation::new(Severity::Warning, format!("High posting frequency ({:.1} posts/day)", rate)),
        ))
    } else if rate > 3.0 {
        Some((
            5,
            Explanation::new(
                Severity::Info,
                format!("Active posting ({:.1} posts/day - could be legitimate business)", rate),
            ),
        ))
    } else {
        None
    }
}

fn content_repetition(account: &AccountProfile, _age_days: i64) -> Option<FactorHit> {
    let pct = account.repetitive_content;

    if pct > 70 {
        Some((
            15,
            Explanation::new(Severity::Critical, format!("Very repetitive content ({}% similar posts)", pct)),
        ))
    } else if pct > 50 {
        Some((
            8,
            Explanation::new(
                Severity::Warning,
                format!("Moderately repetitive content ({}% - could be marketing)", pct),
            ),
        ))
    } else if pct > 30 {
        Some((
            3,
            Explanation::new(
                Severity::Info,
                format!("Some content repetition ({}% - possibly promotional)", pct),
            ),
        ))
    } else {
        None
    }
}

fn messaging_volume(account: &AccountProfile, _age_days: i64) -> Option<FactorHit> {
    let per_day = account.messages_sent_per_day;

    if per_day > 50 {
        Some((
            15,
            Explanation::new(Severity::Critical, format!("Mass messaging activity ({} messages/day)", per_day)),
        ))
    } else if per_day > 20 {
        Some((
            8,
            Explanation::new(Severity::Warning, format!("High messaging volume ({} messages/day)", per_day)),
        ))
    } else {
        None
    }
}

fn suspicious_links(account: &AccountProfile, _age_days: i64) -> Option<FactorHit> {
    let pct = account.suspicious_links;

    if pct > 40 {
        Some((
            10,
            Explanation::new(Severity::Critical, format!("Many suspicious links ({}% of posts)", pct)),
        ))
    } else if pct > 20 {
        Some((
            6,
            Explanation::new(Severity::Warning, format!("Moderate suspicious links ({}% of posts)", pct)),
        ))
    } else if pct > 10 {
        Some((
            2,
            Explanation::new(
                Severity::Info,
                format!("Some external links ({}% - possibly promotional)", pct),
            ),
        ))
    } else {
        None
    }
}

fn network_connections(account: &AccountProfile, _age_days: i64) -> Option<FactorHit> {
    let flags = account.network_flags;

    if flags > 3 {
        Some((
            5,
            Explanation::new(
                Severity::Critical,
                format!("Connected to {} flagged accounts (coordinated behavior)", flags),
            ),
        ))
    } else if flags > 0 {
        Some((
            2,
            Explanation::new(Severity::Warning, format!("Connected to {} flagged account(s)", flags)),
        ))
    } else {
        None
    }
}

/// Reassuring signals, listed only for low-risk accounts
fn positive_signals(account: &AccountProfile, age_days: i64) -> Vec<Explanation> {
    let mut signals = Vec::new();
    if account.verified {
        signals.push(Explanation::new(Severity::Positive, "Verified account"));
    }
    if account.has_profile_pic {
        signals.push(Explanation::new(Severity::Positive, "Has profile picture"));
    }
    if account.bio_length > 50 {
        signals.push(Explanation::new(Severity::Positive, "Complete profile with bio"));
    }
    if age_days > 365 {
        signals.push(Explanation::new(Severity::Positive, "Established account (over 1 year old)"));
    }
    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generator::demo_accounts;
    use crate::model::AccountType;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
    }

    fn quiet_account(age_days: i64) -> AccountProfile {
        AccountProfile {
            account_id: "quiet".to_string(),
            account_type: AccountType::NormalUser,
            created_date: now() - Duration::days(age_days),
            followers: 300,
            following: 300,
            posts: 100,
            posts_per_day: 0.5,
            bio_length: 10,
            has_profile_pic: false,
            verified: false,
            avg_likes_per_post: 20,
            messages_sent_per_day: 2,
            repetitive_content: 5,
            suspicious_links: 0,
            network_flags: 0,
        }
    }

    fn messages(assessment: &RiskAssessment) -> Vec<String> {
        assessment.explanations.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_quiet_old_account_scores_zero() {
        let assessment = calculate_risk_score(&quiet_account(400), now());
        assert_eq!(assessment.risk_score, 0);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert_eq!(messages(&assessment), vec!["✅ Established account (over 1 year old)"]);
    }

    #[test]
    fn test_age_bands() {
        assert_eq!(calculate_risk_score(&quiet_account(29), now()).risk_score, 15);
        assert_eq!(calculate_risk_score(&quiet_account(30), now()).risk_score, 8);
        assert_eq!(calculate_risk_score(&quiet_account(89), now()).risk_score, 8);
        assert_eq!(calculate_risk_score(&quiet_account(90), now()).risk_score, 3);
        assert_eq!(calculate_risk_score(&quiet_account(179), now()).risk_score, 3);
        assert_eq!(calculate_risk_score(&quiet_account(180), now()).risk_score, 0);
    }

    #[test]
    fn test_follow_pattern_bands() {
        let mut account = quiet_account(400);
        account.following = 2500;
        account.followers = 99;
        assert_eq!(calculate_risk_score(&account, now()).risk_score, 20);

        // ratio below 0.1 without the bot-like extreme
        account.following = 1500;
        account.followers = 100;
        assert_eq!(calculate_risk_score(&account, now()).risk_score, 12);

        account.following = 0;
        assert_eq!(calculate_risk_score(&account, now()).risk_score, 0);

        account.following = 400;
        account.followers = 6000;
        let assessment = calculate_risk_score(&account, now());
        assert_eq!(assessment.risk_score, 0);
        assert!(messages(&assessment)[0].starts_with("✅ High influence"));
    }

    #[test]
    fn test_posting_frequency_message_format() {
        let mut account = quiet_account(400);
        account.posts_per_day = 12.345;
        let assessment = calculate_risk_score(&account, now());
        assert_eq!(assessment.risk_score, 20);
        assert_eq!(
            assessment.explanations[0].message,
            "Extremely high posting frequency (12.3 posts/day - likely automated)"
        );

        account.posts_per_day = 5.0;
        assert_eq!(calculate_risk_score(&account, now()).risk_score, 5);
    }

    #[test]
    fn test_positive_signals_only_when_low() {
        let mut account = quiet_account(400);
        account.verified = true;
        account.has_profile_pic = true;
        account.bio_length = 120;
        let assessment = calculate_risk_score(&account, now());
        assert_eq!(
            messages(&assessment),
            vec![
                "✅ Verified account",
                "✅ Has profile picture",
                "✅ Complete profile with bio",
                "✅ Established account (over 1 year old)",
            ]
        );

        account.messages_sent_per_day = 60;
        account.repetitive_content = 80;
        account.suspicious_links = 50;
        let assessment = calculate_risk_score(&account, now());
        assert_eq!(assessment.risk_score, 40);
        assert_eq!(assessment.risk_level, RiskLevel::Moderate);
        assert!(assessment.explanations.iter().all(|e| e.severity != Severity::Positive));
    }

    #[test]
    fn test_demo_accounts_scores() {
        let scored = analyze_batch(demo_accounts(now()), now());
        let scores: Vec<(&str, u8, RiskLevel)> = scored
            .iter()
            .map(|row| (row.account.account_id.as_str(), row.assessment.risk_score, row.assessment.risk_level))
            .collect();

        assert_eq!(
            scores,
            vec![
                ("demo_coffee_shop", 11, RiskLevel::Low),
                ("demo_influencer", 15, RiskLevel::Low),
                ("demo_scammer", 100, RiskLevel::High),
            ]
        );
        assert_eq!(scored[2].assessment.explanations.len(), 7);
        assert_eq!(
            scored[2].assessment.recommendation,
            RiskLevel::High.recommendation()
        );
    }

    #[test]
    fn test_distribution_and_histogram() {
        let scored = analyze_batch(demo_accounts(now()), now());
        let distribution = risk_distribution(scored.iter().map(|row| &row.assessment));
        assert_eq!(distribution.total, 3);
        assert_eq!(distribution.low_risk, 2);
        assert_eq!(distribution.high_risk, 1);
        assert!((distribution.avg_score - 42.0).abs() < 1e-9);

        let histogram = score_histogram(scored.iter().map(|row| &row.assessment), 20);
        assert_eq!(histogram.len(), 20);
        assert_eq!(histogram[2].count, 1); // 11
        assert_eq!(histogram[3].count, 1); // 15
        assert_eq!(histogram[19].count, 1); // 100
        assert_eq!(histogram.iter().map(|b| b.count).sum::<u64>(), 3);
    }

    #[test]
    fn test_empty_distribution() {
        let distribution = risk_distribution(std::iter::empty());
        assert_eq!(distribution, RiskDistribution::default());
        assert_eq!(distribution.avg_score, 0.0);
    }
}
