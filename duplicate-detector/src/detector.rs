use crate::normalize::{normalize_content, normalize_title, normalize_url};
use crate::similarity::similarity_ratio;
use gemscout_core::Post;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 over the normalized (title, url, text) triple. Posts sharing
/// a fingerprint are exact duplicates regardless of superficial
/// differences in the raw fields.
pub fn content_fingerprint(title: &str, url: &str, text: &str) -> String {
    let combined = format!(
        "{}|{}|{}",
        normalize_title(title),
        normalize_url(url),
        normalize_content(text)
    );
    hex::encode(Sha256::digest(combined.as_bytes()))
}

/// Similarity thresholds for the fuzzy path. Empirical values carried
/// over unchanged; the same-author threshold is deliberately lower
/// because repeat submissions by one account are the main spam pattern.
#[derive(Debug, Clone, Copy)]
pub struct DetectorThresholds {
    pub url_similarity: f64,
    pub title_similarity: f64,
    pub content_similarity: f64,
    pub same_author: f64,
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        Self {
            url_similarity: 0.95,
            title_similarity: 0.85,
            content_similarity: 0.8,
            same_author: 0.7,
        }
    }
}

/// Outcome of comparing one pair of posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub is_duplicate: bool,
    pub url_similarity: f64,
    pub title_similarity: f64,
    pub content_similarity: f64,
    pub same_author: bool,
    pub reasons: Vec<String>,
    /// Highest of the three similarities; 1.0 on the exact-match path.
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateAction {
    RemoveLowerQuality,
    FlagSpamBehavior,
}

/// Which of a duplicate pair to keep, and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeepRecommendation {
    pub action: DuplicateAction,
    pub keep_hn_id: i64,
    pub remove_hn_id: i64,
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DuplicateDetector {
    thresholds: DetectorThresholds,
}

impl DuplicateDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: DetectorThresholds) -> Self {
        Self { thresholds }
    }

    /// Compare two posts. The fingerprint fast path short-circuits the
    /// fuzzy comparison entirely; otherwise three per-field similarity
    /// ratios feed the threshold table.
    pub fn compare(&self, a: &Post, b: &Post) -> MatchReport {
        let a_url = a.url.as_deref().unwrap_or("");
        let b_url = b.url.as_deref().unwrap_or("");
        let a_text = a.text.as_deref().unwrap_or("");
        let b_text = b.text.as_deref().unwrap_or("");

        let same_author =
            !a.author.is_empty() && a.author.to_lowercase() == b.author.to_lowercase();

        // Fast path: identical normalized content.
        let fp_a = content_fingerprint(&a.title, a_url, a_text);
        let fp_b = content_fingerprint(&b.title, b_url, b_text);
        if fp_a == fp_b {
            return MatchReport {
                is_duplicate: true,
                url_similarity: 1.0,
                title_similarity: 1.0,
                content_similarity: 1.0,
                same_author,
                reasons: vec!["Exact content match".to_string()],
                confidence: 1.0,
            };
        }

        let norm_url_a = normalize_url(a_url);
        let norm_url_b = normalize_url(b_url);
        let norm_title_a = normalize_title(&a.title);
        let norm_title_b = normalize_title(&b.title);
        let norm_text_a = normalize_content(a_text);
        let norm_text_b = normalize_content(b_text);

        let url_similarity = if !norm_url_a.is_empty() && !norm_url_b.is_empty() {
            similarity_ratio(&norm_url_a, &norm_url_b)
        } else {
            0.0
        };
        let title_similarity = similarity_ratio(&norm_title_a, &norm_title_b);
        let content_similarity = if !norm_text_a.is_empty() && !norm_text_b.is_empty() {
            similarity_ratio(&norm_text_a, &norm_text_b)
        } else {
            0.0
        };

        let mut reasons = Vec::new();
        if url_similarity >= self.thresholds.url_similarity {
            reasons.push(format!("URL similarity: {:.3}", url_similarity));
        }
        if title_similarity >= self.thresholds.title_similarity {
            reasons.push(format!("Title similarity: {:.3}", title_similarity));
        }
        if content_similarity >= self.thresholds.content_similarity {
            reasons.push(format!("Content similarity: {:.3}", content_similarity));
        }
        if same_author
            && (title_similarity >= self.thresholds.same_author
                || content_similarity >= self.thresholds.same_author)
        {
            reasons.push(format!(
                "Same author, similar content (T:{:.3}, C:{:.3})",
                title_similarity, content_similarity
            ));
        }

        MatchReport {
            is_duplicate: !reasons.is_empty(),
            url_similarity,
            title_similarity,
            content_similarity,
            same_author,
            reasons,
            confidence: url_similarity.max(title_similarity).max(content_similarity),
        }
    }

    /// For a confirmed duplicate pair, pick the post to keep: higher HN
    /// score, else earlier HN creation time, else lower HN id. A
    /// same-author pair is flagged as spam behavior rather than a plain
    /// repost.
    pub fn recommend(&self, a: &Post, b: &Post, report: &MatchReport) -> KeepRecommendation {
        let action = if report.same_author {
            DuplicateAction::FlagSpamBehavior
        } else {
            DuplicateAction::RemoveLowerQuality
        };

        let mut reasoning = Vec::new();
        if report.same_author {
            reasoning.push("Same author posting duplicate content".to_string());
        }

        let keep_a = if a.score != b.score {
            reasoning.push(format!("Higher HN score ({} vs {})", a.score.max(b.score), a.score.min(b.score)));
            a.score > b.score
        } else if a.hn_created_at != b.hn_created_at {
            reasoning.push("Posted earlier (likely original)".to_string());
            a.hn_created_at < b.hn_created_at
        } else {
            reasoning.push(format!(
                "Tie-breaker: keeping lower HN id ({})",
                a.hn_id.min(b.hn_id)
            ));
            a.hn_id < b.hn_id
        };

        let (keep, remove) = if keep_a { (a, b) } else { (b, a) };
        KeepRecommendation {
            action,
            keep_hn_id: keep.hn_id,
            remove_hn_id: remove.hn_id,
            reasoning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn post(hn_id: i64, title: &str, url: Option<&str>, text: &str, author: &str) -> Post {
        let created = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        Post {
            id: None,
            hn_id,
            title: title.to_string(),
            url: url.map(|u| u.to_string()),
            text: if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            },
            author: author.to_string(),
            author_karma: 10,
            account_age_days: 30,
            score: 1,
            descendants: 0,
            hn_created_at: created,
            discovered_at: created,
            updated_at: None,
            is_hidden_gem: false,
            is_spam: false,
            current_hn_score: 1,
            last_checked_at: None,
        }
    }

    #[test]
    fn identical_posts_hit_the_exact_match_path() {
        let detector = DuplicateDetector::new();
        let a = post(1, "My tool", Some("https://example.com/x"), "body", "alice");
        let b = post(2, "My tool", Some("https://example.com/x"), "body", "bob");

        let report = detector.compare(&a, &b);
        assert!(report.is_duplicate);
        assert_eq!(report.confidence, 1.0);
        assert_eq!(report.reasons, vec!["Exact content match".to_string()]);
    }

    #[test]
    fn tracking_params_only_difference_is_exact_match() {
        let detector = DuplicateDetector::new();
        let a = post(
            1,
            "Interesting article",
            Some("https://example.com/story?utm_source=twitter"),
            "",
            "alice",
        );
        let b = post(
            2,
            "Interesting article",
            Some("https://example.com/story"),
            "",
            "bob",
        );

        let report = detector.compare(&a, &b);
        assert!(report.is_duplicate);
        assert_eq!(report.confidence, 1.0);
        assert_eq!(report.reasons, vec!["Exact content match".to_string()]);
    }

    #[test]
    fn comparison_is_symmetric() {
        let detector = DuplicateDetector::new();
        let cases = [
            (
                post(1, "My static site generator", Some("https://a.example/x"), "", "alice"),
                post(2, "My static site generator v2", Some("https://a.example/y"), "", "bob"),
            ),
            (
                post(3, "Completely different", None, "some text here", "carol"),
                post(4, "Nothing alike at all", None, "other words entirely", "dave"),
            ),
            (
                post(5, "Same author repost", None, "identical-ish body", "eve"),
                post(6, "Same author repost!", None, "identical-ish body.", "eve"),
            ),
        ];

        for (a, b) in &cases {
            let ab = detector.compare(a, b);
            let ba = detector.compare(b, a);
            assert_eq!(ab.is_duplicate, ba.is_duplicate);
            assert_eq!(ab.confidence, ba.confidence);
            assert_eq!(ab.title_similarity, ba.title_similarity);
        }
    }

    #[test]
    fn distinct_posts_are_not_duplicates() {
        let detector = DuplicateDetector::new();
        let a = post(
            1,
            "Rust async runtime internals",
            Some("https://blog.example/rust-async"),
            "",
            "alice",
        );
        let b = post(
            2,
            "Gardening tips for spring",
            Some("https://garden.example/tips"),
            "",
            "bob",
        );
        let report = detector.compare(&a, &b);
        assert!(!report.is_duplicate);
        assert!(report.reasons.is_empty());
    }

    #[test]
    fn same_author_gets_the_lower_threshold() {
        let detector = DuplicateDetector::new();
        // Titles ~0.78 similar: below the 0.85 general threshold, above
        // the 0.7 same-author threshold.
        let a = post(1, "my little webassembly compiler", None, "", "eve");
        let b = post(2, "my little webassembly compiler with a demo site", None, "", "eve");

        let cross = detector.compare(&post(1, &a.title, None, "", "alice"), &b);
        assert!(!cross.is_duplicate);

        let same = detector.compare(&a, &b);
        assert!(same.is_duplicate);
        assert!(same.reasons.iter().any(|r| r.starts_with("Same author")));
    }

    #[test]
    fn recommendation_prefers_higher_score() {
        let detector = DuplicateDetector::new();
        let mut a = post(10, "Tool", Some("https://example.com/t"), "", "alice");
        let mut b = post(20, "Tool", Some("https://example.com/t"), "", "bob");
        a.score = 3;
        b.score = 40;

        let report = detector.compare(&a, &b);
        let rec = detector.recommend(&a, &b, &report);
        assert_eq!(rec.action, DuplicateAction::RemoveLowerQuality);
        assert_eq!(rec.keep_hn_id, 20);
        assert_eq!(rec.remove_hn_id, 10);
    }

    #[test]
    fn recommendation_falls_back_to_creation_time_then_id() {
        let detector = DuplicateDetector::new();
        let mut a = post(10, "Tool", None, "same body text", "alice");
        let b = post(20, "Tool", None, "same body text", "bob");
        a.hn_created_at = b.hn_created_at - chrono::Duration::hours(2);

        let report = detector.compare(&a, &b);
        let rec = detector.recommend(&a, &b, &report);
        assert_eq!(rec.keep_hn_id, 10);

        // Full tie: lower id wins.
        let c = post(30, "Tool", None, "same body text", "carol");
        let d = post(31, "Tool", None, "same body text", "dan");
        let rec = detector.recommend(&c, &d, &detector.compare(&c, &d));
        assert_eq!(rec.keep_hn_id, 30);
        assert!(rec
            .reasoning
            .iter()
            .any(|r| r.contains("lower HN id")));
    }

    #[test]
    fn same_author_pair_is_flagged_as_spam_behavior() {
        let detector = DuplicateDetector::new();
        let a = post(1, "Repost city", None, "the same exact text", "eve");
        let b = post(2, "Repost city", None, "the same exact text", "eve");

        let report = detector.compare(&a, &b);
        let rec = detector.recommend(&a, &b, &report);
        assert_eq!(rec.action, DuplicateAction::FlagSpamBehavior);
        assert!(rec
            .reasoning
            .iter()
            .any(|r| r.contains("Same author")));
    }
}
