use crate::github::RepoSignalSource;
use crate::keywords::*;
use gemscout_core::{CoreError, QualityScores};
use std::sync::Arc;
use tracing::{debug, warn};

/// The parts of a post the scorer looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostContent<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub url: Option<&'a str>,
}

/// Heuristic quality scorer. Produces the seven-dimension vector of
/// [`QualityScores`]; every dimension lands in [0, 1]. The optional
/// code-host signal is the only part that leaves the process.
pub struct QualityAnalyzer {
    repo_signal: Option<Arc<dyn RepoSignalSource>>,
}

const WEIGHT_TECHNICAL_DEPTH: f64 = 0.25;
const WEIGHT_ORIGINALITY: f64 = 0.25;
const WEIGHT_PROBLEM_SOLVING: f64 = 0.20;
const WEIGHT_CODE_HOST: f64 = 0.15;
const WEIGHT_DOMAIN_REPUTATION: f64 = 0.10;
const WEIGHT_SPAM_PENALTY: f64 = 0.5;

impl QualityAnalyzer {
    pub fn new() -> Self {
        Self { repo_signal: None }
    }

    pub fn with_repo_signal(repo_signal: Arc<dyn RepoSignalSource>) -> Self {
        Self {
            repo_signal: Some(repo_signal),
        }
    }

    /// Score a post. Never fails: any internal error degrades to the
    /// fixed default vector so a bad post cannot abort a sweep.
    pub async fn analyze(&self, post: &PostContent<'_>) -> QualityScores {
        match self.try_analyze(post).await {
            Ok(scores) => {
                debug!(
                    overall = scores.overall_interest,
                    spam = scores.spam_likelihood,
                    "analyzed post"
                );
                scores
            }
            Err(e) => {
                warn!("Quality analysis failed, using default scores: {}", e);
                QualityScores::default_on_error()
            }
        }
    }

    async fn try_analyze(&self, post: &PostContent<'_>) -> Result<QualityScores, CoreError> {
        let title_lower = post.title.to_lowercase();
        let text_lower = post.text.to_lowercase();
        let url = post.url.unwrap_or("");
        let combined = format!("{} {}", title_lower, text_lower);

        let technical_depth = technical_depth(&combined, url);
        let originality = originality(&title_lower, &combined, url);
        let problem_solving = problem_solving(&combined);
        let spam_likelihood = spam_likelihood(post.title, &combined, url, post.text);
        let domain_reputation = domain_reputation(post.url);

        let code_host_reputation = match (&self.repo_signal, post.url) {
            (Some(signal), Some(url)) if url.contains("github.com") => {
                signal.repo_quality(url).await.unwrap_or(0.0)
            }
            _ => 0.0,
        };

        let overall_interest = overall_interest(
            technical_depth,
            originality,
            problem_solving,
            code_host_reputation,
            domain_reputation,
            spam_likelihood,
        );

        Ok(QualityScores {
            technical_depth,
            originality,
            problem_solving,
            spam_likelihood,
            overall_interest,
            code_host_reputation,
            domain_reputation,
        })
    }
}

impl Default for QualityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn count_matches(haystack: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| haystack.contains(*k)).count()
}

/// Basic keywords count toward 0.6, advanced keywords toward 0.4 with a
/// 1.5x multiplier, plus a flat bonus for links into known technical
/// hosts. Clamped to 1.0.
fn technical_depth(combined: &str, url: &str) -> f64 {
    let basic = (count_matches(combined, TECH_KEYWORDS) as f64 / 5.0).min(0.6);
    let advanced = (count_matches(combined, ADVANCED_KEYWORDS) as f64 / 3.0).min(0.4) * 1.5;
    let domain_bonus = if TECH_DOMAINS.iter().any(|d| url.contains(d)) {
        0.2
    } else {
        0.0
    };
    (basic + advanced + domain_bonus).min(1.0)
}

/// Additive bonuses for signals that the author made the thing.
fn originality(title: &str, combined: &str, url: &str) -> f64 {
    let mut score: f64 = 0.0;

    if title.starts_with("show hn:") {
        score += 0.4;
    }
    if CREATION_WORDS.iter().any(|w| combined.contains(w)) {
        score += 0.3;
    }
    if url.contains("github.com") {
        score += 0.2;
    }
    if PERSONAL_INDICATORS.iter().any(|p| title.contains(p)) {
        score += 0.2;
    }
    if DEMO_WORDS.iter().any(|w| combined.contains(w)) {
        score += 0.1;
    }

    score.min(1.0)
}

fn problem_solving(combined: &str) -> f64 {
    let solutions = (count_matches(combined, SOLUTION_KEYWORDS) as f64 / 3.0).min(0.7);
    let pain_points = (count_matches(combined, PAIN_POINT_KEYWORDS) as f64 / 2.0).min(0.3);
    (solutions + pain_points).min(1.0)
}

/// Additive spam penalties, clamped to 1.0. `raw_title` keeps its case
/// so all-caps runs are visible.
fn spam_likelihood(raw_title: &str, combined: &str, url: &str, raw_text: &str) -> f64 {
    let mut score: f64 = 0.0;

    if raw_title.chars().count() < 20 {
        score += 0.2;
    }
    if raw_title.matches('!').count() > 1 {
        score += 0.3;
    }
    if count_caps_runs(raw_title) > 2 {
        score += 0.4;
    }

    let spam_hits = count_matches(combined, SPAM_KEYWORDS);
    score += (spam_hits as f64 * 0.2).min(0.6);

    if combined.contains("$$$") || combined.contains('💰') {
        score += 0.3;
    }
    if url.is_empty() && raw_text.chars().count() < 50 {
        score += 0.4;
    }
    if SUSPICIOUS_DOMAINS.iter().any(|d| url.contains(d)) {
        score += 0.3;
    }

    score.min(1.0)
}

/// Runs of three or more consecutive uppercase ASCII letters.
fn count_caps_runs(title: &str) -> usize {
    let mut runs = 0;
    let mut current = 0;
    for c in title.chars() {
        if c.is_ascii_uppercase() {
            current += 1;
            if current == 3 {
                runs += 1;
            }
        } else {
            current = 0;
        }
    }
    runs
}

/// Fixed reputation lookup. Text-only posts score neutral.
fn domain_reputation(url: Option<&str>) -> f64 {
    let url = match url {
        Some(u) if !u.is_empty() => u,
        _ => return 0.5,
    };

    let host = url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .unwrap_or_else(|| url.to_lowercase());

    if HIGH_REPUTATION_DOMAINS.iter().any(|d| host.contains(d)) {
        0.8
    } else if MEDIUM_REPUTATION_DOMAINS.iter().any(|d| host.contains(d)) {
        0.6
    } else {
        0.4
    }
}

fn overall_interest(
    technical_depth: f64,
    originality: f64,
    problem_solving: f64,
    code_host_reputation: f64,
    domain_reputation: f64,
    spam_likelihood: f64,
) -> f64 {
    let overall = technical_depth * WEIGHT_TECHNICAL_DEPTH
        + originality * WEIGHT_ORIGINALITY
        + problem_solving * WEIGHT_PROBLEM_SOLVING
        + code_host_reputation * WEIGHT_CODE_HOST
        + domain_reputation * WEIGHT_DOMAIN_REPUTATION
        - spam_likelihood * WEIGHT_SPAM_PENALTY;

    overall.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn analyze(title: &str, text: &str, url: Option<&str>) -> QualityScores {
        QualityAnalyzer::new()
            .analyze(&PostContent { title, text, url })
            .await
    }

    fn assert_bounded(scores: &QualityScores) {
        for (name, value) in [
            ("technical_depth", scores.technical_depth),
            ("originality", scores.originality),
            ("problem_solving", scores.problem_solving),
            ("spam_likelihood", scores.spam_likelihood),
            ("overall_interest", scores.overall_interest),
            ("code_host_reputation", scores.code_host_reputation),
            ("domain_reputation", scores.domain_reputation),
        ] {
            assert!(
                (0.0..=1.0).contains(&value),
                "{} out of bounds: {}",
                name,
                value
            );
        }
    }

    #[tokio::test]
    async fn all_dimensions_stay_bounded() {
        let titles = [
            "",
            "Show HN: my tiny tool",
            "BUY NOW!!! CRYPTO NFT TRADING FOREX $$$ GET RICH",
            "A deep dive into distributed systems, concurrency, consensus, \
             cryptography, compiler design, memory management and garbage collection",
            "Solution that solves, fixes, helps, automates, simplifies, improves, \
             optimizes and reduces everything frustrating, slow, manual and tedious",
        ];
        let texts = ["", "I built this with rust and python", "💰💰💰"];
        let urls = [
            None,
            Some("https://github.com/someone/project"),
            Some("https://bit.ly/2xyz"),
            Some("not a url at all"),
        ];

        for title in titles {
            for text in texts {
                for url in urls {
                    let scores = analyze(title, text, url).await;
                    assert_bounded(&scores);
                }
            }
        }
    }

    #[tokio::test]
    async fn show_hn_scenario_classifies_strongly() {
        let scores = analyze(
            "Show HN: my tiny tool",
            "I built this around a neat algorithm",
            Some("https://github.com/someone/tiny-tool"),
        )
        .await;

        // 0.4 show bonus + 0.3 creation verb + 0.2 code host + 0.2
        // possessive phrasing puts originality past 0.7 before the clamp.
        assert!(scores.originality >= 0.7);
        assert!(scores.technical_depth > 0.0);
        assert!(scores.spam_likelihood < 0.4);
        assert!(scores.overall_interest >= 0.3);
    }

    #[tokio::test]
    async fn spam_signals_add_up() {
        let clean = analyze(
            "A thorough write-up of our database migration",
            "Long form text describing the approach in detail, well beyond fifty characters.",
            Some("https://example.com/blog/migration"),
        )
        .await;
        assert!(clean.spam_likelihood < 0.4);

        let spammy = analyze(
            "GET RICH NOW!!! FREE CRYPTO NFT",
            "earn money fast $$$ click here, limited time, act now",
            Some("https://bit.ly/abc"),
        )
        .await;
        assert!(spammy.spam_likelihood >= 0.7);
        assert_eq!(spammy.overall_interest, 0.0);
    }

    #[tokio::test]
    async fn short_title_and_empty_body_penalized() {
        let scores = analyze("Hi", "", None).await;
        // Short title (0.2) + empty body with no link (0.4).
        assert!(scores.spam_likelihood >= 0.6);
    }

    #[tokio::test]
    async fn domain_reputation_tiers() {
        assert_eq!(
            analyze("A title long enough here", "text", Some("https://github.com/a/b"))
                .await
                .domain_reputation,
            0.8
        );
        assert_eq!(
            analyze("A title long enough here", "text", Some("https://gitlab.com/a/b"))
                .await
                .domain_reputation,
            0.6
        );
        assert_eq!(
            analyze(
                "A title long enough here",
                "text",
                Some("https://obscure-blog.example")
            )
            .await
            .domain_reputation,
            0.4
        );
        assert_eq!(
            analyze("A title long enough here", "text", None)
                .await
                .domain_reputation,
            0.5
        );
    }

    #[tokio::test]
    async fn caps_runs_counted_on_raw_title() {
        assert_eq!(count_caps_runs("hello world"), 0);
        assert_eq!(count_caps_runs("BUY NOW CHEAP"), 3);
        assert_eq!(count_caps_runs("NASA and IBM and GNU"), 3);

        let scores = analyze("AAA BBB CCC something longer", "body text here", None).await;
        assert!(scores.spam_likelihood >= 0.4);
    }

    #[test]
    fn default_vector_is_the_documented_fallback() {
        let scores = QualityScores::default_on_error();
        assert_eq!(scores.spam_likelihood, 0.5);
        assert_eq!(scores.domain_reputation, 0.4);
        assert_eq!(scores.overall_interest, 0.0);
        assert_eq!(scores.technical_depth, 0.0);
    }

    #[tokio::test]
    async fn technical_depth_caps() {
        // Every advanced keyword present: capped at 0.4 then weighted,
        // plus basic overlap; still clamped to 1.0.
        let loaded = ADVANCED_KEYWORDS.join(" ") + " " + &TECH_KEYWORDS.join(" ");
        let scores = analyze("A reasonably long title", &loaded, None).await;
        assert_eq!(scores.technical_depth, 1.0);
    }
}
