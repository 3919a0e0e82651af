use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Hacker News story as we persist it. Identity is the external
/// `hn_id`; the row is created once on first observation and the
/// title/url/text only change through an explicit refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Option<i64>,
    pub hn_id: i64,
    pub title: String,
    pub url: Option<String>,
    pub text: Option<String>,
    pub author: String,
    pub author_karma: i64,
    pub account_age_days: i64,
    pub score: i64,
    pub descendants: i64,
    pub hn_created_at: DateTime<Utc>,
    pub discovered_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_hidden_gem: bool,
    pub is_spam: bool,
    pub current_hn_score: i64,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn hn_url(&self) -> String {
        format!("https://news.ycombinator.com/item?id={}", self.hn_id)
    }

    /// Age of the story on HN at a given instant, in hours.
    pub fn age_hours_at(&self, now: DateTime<Utc>) -> f64 {
        (now - self.hn_created_at).num_seconds() as f64 / 3600.0
    }

    /// How long after the story appeared on HN we discovered it, in hours.
    pub fn discovery_lag_hours(&self) -> f64 {
        (self.discovered_at - self.hn_created_at).num_seconds() as f64 / 3600.0
    }
}

/// A Hacker News account we have seen as an author. Aggregate counts are
/// recomputed from the posts table, never incremented in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub username: String,
    pub karma: i64,
    pub hn_created_at: Option<DateTime<Utc>>,
    pub first_seen_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub total_posts: i64,
    pub hidden_gems_count: i64,
    pub hall_of_fame_count: i64,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn account_age_days_at(&self, now: DateTime<Utc>) -> i64 {
        match self.hn_created_at {
            Some(created) => (now - created).num_days().max(0),
            None => 0,
        }
    }
}

/// The seven-dimension quality vector produced by the analyzer.
/// Every dimension is in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    pub technical_depth: f64,
    pub originality: f64,
    pub problem_solving: f64,
    pub spam_likelihood: f64,
    pub overall_interest: f64,
    pub code_host_reputation: f64,
    pub domain_reputation: f64,
}

impl QualityScores {
    /// Fixed fallback when analysis fails: neutral spam suspicion,
    /// unknown-domain reputation, zero everywhere else.
    pub fn default_on_error() -> Self {
        Self {
            technical_depth: 0.0,
            originality: 0.0,
            problem_solving: 0.0,
            spam_likelihood: 0.5,
            overall_interest: 0.0,
            code_host_reputation: 0.0,
            domain_reputation: 0.4,
        }
    }
}

/// Persisted quality-score row, one-to-one with its post. Overwritten
/// wholesale on rescoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityScoreRecord {
    pub id: Option<i64>,
    pub post_id: i64,
    pub scores: QualityScores,
    pub analyzer_version: String,
    pub analyzed_at: DateTime<Utc>,
    pub analysis_time_ms: Option<i64>,
    pub manual_override: bool,
    pub manual_score: Option<f64>,
    pub manual_notes: Option<String>,
    pub manual_updated_by: Option<String>,
    pub manual_updated_at: Option<DateTime<Utc>>,
}

pub const ANALYZER_VERSION: &str = "1.0";

impl QualityScoreRecord {
    pub fn new(post_id: i64, scores: QualityScores, analyzed_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            post_id,
            scores,
            analyzer_version: ANALYZER_VERSION.to_string(),
            analyzed_at,
            analysis_time_ms: None,
            manual_override: false,
            manual_score: None,
            manual_notes: None,
            manual_updated_by: None,
            manual_updated_at: None,
        }
    }

    /// Manual override short-circuits the computed value when present.
    pub fn effective_score(&self) -> f64 {
        match (self.manual_override, self.manual_score) {
            (true, Some(score)) => score,
            _ => self.scores.overall_interest,
        }
    }
}

/// Coarse classification of how far a verified gem's score rose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessTier {
    Top100,
    FrontPage,
    Viral,
}

impl SuccessTier {
    pub fn for_score(score: i64) -> Self {
        if score >= 500 {
            SuccessTier::Viral
        } else if score >= 200 {
            SuccessTier::FrontPage
        } else {
            SuccessTier::Top100
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuccessTier::Top100 => "top_100",
            SuccessTier::FrontPage => "front_page",
            SuccessTier::Viral => "viral",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "top_100" => Some(SuccessTier::Top100),
            "front_page" => Some(SuccessTier::FrontPage),
            "viral" => Some(SuccessTier::Viral),
            _ => None,
        }
    }
}

/// Permanent record of a gem that was later verified successful.
/// Success fields are written exactly once, on the first threshold
/// crossing; the peak score keeps updating afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HallOfFameEntry {
    pub id: Option<i64>,
    pub post_id: i64,
    pub discovered_at: DateTime<Utc>,
    pub discovery_score: f64,
    pub discovery_hn_score: i64,
    pub discovery_karma: i64,
    pub hn_age_at_discovery_hours: Option<f64>,
    pub success_at: Option<DateTime<Utc>>,
    pub success_hn_score: Option<i64>,
    pub peak_hn_score: i64,
    pub success_threshold: i64,
    pub lead_time_hours: Option<f64>,
    pub success_tier: Option<SuccessTier>,
    pub success_verified: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl HallOfFameEntry {
    /// Apply a freshly observed HN score. The first crossing of
    /// `threshold` sets the success fields permanently; every call moves
    /// the peak monotonically upward.
    pub fn observe_score(&mut self, current_hn_score: i64, threshold: i64, now: DateTime<Utc>) {
        if self.success_at.is_none() && current_hn_score >= threshold {
            self.success_at = Some(now);
            self.success_hn_score = Some(current_hn_score);
            self.success_threshold = threshold;
            self.success_verified = true;
            self.lead_time_hours =
                Some((now - self.discovered_at).num_seconds() as f64 / 3600.0);
            self.success_tier = Some(SuccessTier::for_score(current_hn_score));
            self.updated_at = Some(now);
        }

        if current_hn_score > self.peak_hn_score {
            self.peak_hn_score = current_hn_score;
            self.updated_at = Some(now);
        }
    }

    /// How good our early call was, derived from the story's HN age at
    /// discovery time.
    pub fn discovery_quality(&self) -> &'static str {
        match self.hn_age_at_discovery_hours {
            None => "unknown",
            Some(h) if h < 2.0 => "excellent",
            Some(h) if h < 6.0 => "very_good",
            Some(h) if h < 12.0 => "good",
            Some(_) => "late",
        }
    }

    pub fn score_improvement(&self) -> i64 {
        match self.success_hn_score {
            Some(success) => success - self.discovery_hn_score,
            None => 0,
        }
    }
}
