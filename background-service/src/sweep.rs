use crate::status::{JobState, SweepStats};
use chrono::{DateTime, Duration, TimeZone, Utc};
use database::Database;
use duplicate_detector::DuplicateDetector;
use gemscout_core::{Config, Post, QualityScores};
use hn_client::{ItemSource, StoryCategory};
use quality_analyzer::{PostContent, QualityAnalyzer};
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, error, info, warn};

/// A post is never a gem once its spam likelihood reaches this.
const SPAM_GEM_CEILING: f64 = 0.4;
/// At or above this, the post is flagged spam outright.
const SPAM_FLAG_THRESHOLD: f64 = 0.7;
/// Duplicate candidates are drawn from this many days back, bounded so
/// the pairwise comparison stays cheap.
const DUPLICATE_WINDOW_DAYS: i64 = 7;
const DUPLICATE_CANDIDATE_LIMIT: i64 = 50;

/// What happened to one id during a sweep. The loop inspects this to
/// pick a counter bucket and to decide whether to keep scanning;
/// no control flow hides in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Created { is_gem: bool },
    AlreadyKnown,
    /// Upstream returned nothing for this id; the next sweep retries it
    /// implicitly if it is still inside the window.
    Absent,
    NotAStory,
    Untitled,
    MissingAuthor,
    /// Item predates the window cutoff. Ids arrive newest-first, so
    /// this ends the whole scan.
    BeforeWindow,
    /// Another path inserted the same hn_id first. Benign.
    RaceLost,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub processed: u64,
    pub created: u64,
    pub gems_found: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// A sweep was already in flight; this invocation did nothing.
    Skipped,
    Completed(SweepSummary),
}

#[derive(Debug, Clone, Copy)]
pub struct Classification {
    pub is_gem: bool,
    pub is_spam: bool,
}

/// Score-based classification. A gem is a good post from an account the
/// front page would overlook.
pub fn classify_post(
    author_karma: i64,
    scores: &QualityScores,
    karma_threshold: i64,
    min_interest_score: f64,
) -> Classification {
    Classification {
        is_gem: author_karma < karma_threshold
            && scores.overall_interest >= min_interest_score
            && scores.spam_likelihood < SPAM_GEM_CEILING,
        is_spam: scores.spam_likelihood >= SPAM_FLAG_THRESHOLD,
    }
}

/// Drives one ingestion sweep: list recent ids, fetch and score each
/// undiscovered story, classify, check for duplicates, persist.
/// Guarded by a non-blocking single-flight lock; an overlapping
/// invocation is dropped, never queued.
pub struct SweepOrchestrator {
    source: Arc<dyn ItemSource>,
    db: Database,
    analyzer: QualityAnalyzer,
    detector: DuplicateDetector,
    config: Config,
    guard: Semaphore,
    stats: RwLock<SweepStats>,
}

impl SweepOrchestrator {
    pub fn new(
        source: Arc<dyn ItemSource>,
        db: Database,
        analyzer: QualityAnalyzer,
        config: Config,
    ) -> Self {
        Self {
            source,
            db,
            analyzer,
            detector: DuplicateDetector::new(),
            config,
            guard: Semaphore::new(1),
            stats: RwLock::new(SweepStats::default()),
        }
    }

    pub async fn stats(&self) -> SweepStats {
        self.stats.read().await.clone()
    }

    /// Sweep stories from the last `minutes_back` minutes.
    pub async fn run_sweep(&self, minutes_back: u64) -> SweepOutcome {
        let _permit = match self.guard.try_acquire() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Sweep already in progress, skipping");
                return SweepOutcome::Skipped;
            }
        };

        let started = Utc::now();
        self.stats.write().await.state = JobState::Collecting;
        info!("Starting sweep of posts from last {} minutes", minutes_back);

        let cutoff = started - Duration::minutes(minutes_back as i64);
        let ids = self
            .source
            .list_recent_ids(StoryCategory::New, self.config.sweep_max_ids)
            .await;

        let mut summary = SweepSummary::default();
        for hn_id in ids {
            let outcome = self.process_item(hn_id, cutoff).await;
            match outcome {
                ItemOutcome::BeforeWindow => {
                    info!(
                        "Reached posts older than {} minutes, stopping",
                        minutes_back
                    );
                    break;
                }
                ItemOutcome::Created { is_gem } => {
                    summary.processed += 1;
                    summary.created += 1;
                    if is_gem {
                        summary.gems_found += 1;
                    }
                    if summary.created % self.config.sweep_batch_size as u64 == 0 {
                        info!(
                            "Progress: {} posts created, {} gems found",
                            summary.created, summary.gems_found
                        );
                    }
                }
                ItemOutcome::Failed => {
                    summary.processed += 1;
                    summary.errors += 1;
                }
                ItemOutcome::AlreadyKnown
                | ItemOutcome::Absent
                | ItemOutcome::NotAStory
                | ItemOutcome::Untitled
                | ItemOutcome::MissingAuthor
                | ItemOutcome::RaceLost => {
                    summary.processed += 1;
                }
            }
        }

        let duration_secs = (Utc::now() - started).num_milliseconds() as f64 / 1000.0;
        {
            let mut stats = self.stats.write().await;
            stats.last_run = Some(started);
            stats.last_duration_secs = Some(duration_secs);
            stats.posts_processed += summary.processed;
            stats.posts_collected += summary.created;
            stats.gems_found += summary.gems_found;
            stats.errors += summary.errors;
            stats.total_runs += 1;
            stats.state = if summary.errors > 0 && summary.created == 0 && summary.processed > 0 {
                JobState::Errored
            } else {
                JobState::Running
            };
        }

        info!(
            "Sweep completed: {} new posts, {} gems found, {} errors in {:.1}s",
            summary.created, summary.gems_found, summary.errors, duration_secs
        );
        SweepOutcome::Completed(summary)
    }

    async fn process_item(&self, hn_id: i64, cutoff: DateTime<Utc>) -> ItemOutcome {
        match self.db.find_post_by_hn_id(hn_id).await {
            Ok(Some(_)) => return ItemOutcome::AlreadyKnown,
            Ok(None) => {}
            Err(e) => {
                error!("Lookup failed for post {}: {}", hn_id, e);
                return ItemOutcome::Failed;
            }
        }

        let Some(item) = self.source.get_item(hn_id).await else {
            return ItemOutcome::Absent;
        };
        if !item.is_story() {
            return ItemOutcome::NotAStory;
        }

        // An item with no timestamp reads as epoch, which always
        // precedes the cutoff.
        let hn_created_at = item
            .created_at()
            .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap());
        if hn_created_at < cutoff {
            return ItemOutcome::BeforeWindow;
        }

        let title = match item.title.as_deref() {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => return ItemOutcome::Untitled,
        };
        let author = match item.by.as_deref() {
            Some(author) if !author.is_empty() => author.to_string(),
            _ => return ItemOutcome::MissingAuthor,
        };

        let now = Utc::now();
        let profile = self.source.get_user(&author).await;
        let author_karma = profile.as_ref().and_then(|u| u.karma).unwrap_or(0);
        let account_created = profile.as_ref().and_then(|u| u.created_at());
        let account_age_days = account_created
            .map(|created| (now - created).num_days().max(0))
            .unwrap_or(0);

        if let Err(e) = self
            .db
            .upsert_user(&author, author_karma, account_created, now)
            .await
        {
            error!("Failed to upsert user {}: {}", author, e);
            return ItemOutcome::Failed;
        }

        let text = item.text.clone().unwrap_or_default();
        let analysis_started = std::time::Instant::now();
        let scores = self
            .analyzer
            .analyze(&PostContent {
                title: &title,
                text: &text,
                url: item.url.as_deref(),
            })
            .await;
        let analysis_time_ms = analysis_started.elapsed().as_millis() as i64;

        let classification = classify_post(
            author_karma,
            &scores,
            self.config.karma_threshold,
            self.config.min_interest_score,
        );

        let score = item.score.unwrap_or(0);
        let mut post = Post {
            id: None,
            hn_id,
            title,
            url: item.url.clone(),
            text: item.text.clone(),
            author: author.clone(),
            author_karma,
            account_age_days,
            score,
            descendants: item.descendants.unwrap_or(0),
            hn_created_at,
            discovered_at: now,
            updated_at: None,
            is_hidden_gem: classification.is_gem,
            is_spam: classification.is_spam,
            current_hn_score: score,
            last_checked_at: None,
        };

        // A confirmed duplicate overrides the score-based classification.
        let host = post.url.as_deref().and_then(url_host);
        let candidates = match self
            .db
            .duplicate_candidates(
                &author,
                host.as_deref(),
                now - Duration::days(DUPLICATE_WINDOW_DAYS),
                DUPLICATE_CANDIDATE_LIMIT,
            )
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Duplicate candidate lookup failed for {}: {}", hn_id, e);
                return ItemOutcome::Failed;
            }
        };
        for candidate in &candidates {
            let report = self.detector.compare(&post, candidate);
            if report.is_duplicate {
                info!(
                    "Post {} duplicates {} ({}), flagging as spam",
                    hn_id,
                    candidate.hn_id,
                    report.reasons.join("; ")
                );
                post.is_spam = true;
                post.is_hidden_gem = false;
                break;
            }
        }

        match self
            .db
            .insert_post_with_scores(&post, &scores, now, Some(analysis_time_ms))
            .await
        {
            Ok(_) => {
                if post.is_hidden_gem {
                    info!(
                        "Found gem {}: {} (score: {:.2})",
                        hn_id,
                        truncated(&post.title, 50),
                        scores.overall_interest
                    );
                }
                // The post is committed; a stats recompute failure is
                // not worth failing the item over.
                if let Err(e) = self.db.refresh_user_stats(&author).await {
                    warn!("Failed to refresh stats for {}: {}", author, e);
                }
                ItemOutcome::Created {
                    is_gem: post.is_hidden_gem,
                }
            }
            Err(e) if e.is_benign_race() => {
                debug!("Post {} already exists, skipping duplicate insert", hn_id);
                ItemOutcome::RaceLost
            }
            Err(e) => {
                error!("Failed to persist post {}: {}", hn_id, e);
                ItemOutcome::Failed
            }
        }
    }
}

fn url_host(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.to_string())
}

fn truncated(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubSource;
    use std::sync::atomic::Ordering;

    fn test_config() -> Config {
        Config {
            karma_threshold: 100,
            min_interest_score: 0.3,
            ..Config::default()
        }
    }

    async fn build(source: StubSource) -> (Arc<SweepOrchestrator>, Database, Arc<StubSource>) {
        let db = Database::connect_in_memory().await.unwrap();
        let source = Arc::new(source);
        let orchestrator = Arc::new(SweepOrchestrator::new(
            source.clone(),
            db.clone(),
            QualityAnalyzer::new(),
            test_config(),
        ));
        (orchestrator, db, source)
    }

    fn gem_scores() -> QualityScores {
        QualityScores {
            technical_depth: 0.5,
            originality: 0.8,
            problem_solving: 0.3,
            spam_likelihood: 0.1,
            overall_interest: 0.5,
            code_host_reputation: 0.0,
            domain_reputation: 0.8,
        }
    }

    #[test]
    fn classification_rule_respects_karma_threshold() {
        let scores = gem_scores();
        let low_karma = classify_post(10, &scores, 100, 0.3);
        assert!(low_karma.is_gem);
        assert!(!low_karma.is_spam);

        let high_karma = classify_post(150, &scores, 100, 0.3);
        assert!(!high_karma.is_gem);
    }

    #[test]
    fn spam_ceiling_blocks_gem_and_flag_threshold_marks_spam() {
        let mut scores = gem_scores();
        scores.spam_likelihood = 0.5;
        let c = classify_post(10, &scores, 100, 0.3);
        assert!(!c.is_gem);
        assert!(!c.is_spam);

        scores.spam_likelihood = 0.7;
        let c = classify_post(10, &scores, 100, 0.3);
        assert!(!c.is_gem);
        assert!(c.is_spam);
    }

    #[tokio::test]
    async fn replaying_a_sweep_is_idempotent() {
        let mut source = StubSource::new();
        source.push_story(40, "Show HN: my tiny tool", "alice", 10, None);
        source.push_story(41, "A long enough descriptive title", "bob", 5, None);
        source.push_user("alice", 10, None);
        source.push_user("bob", 20, None);

        let (orchestrator, db, _source) = build(source).await;

        let first = orchestrator.run_sweep(60).await;
        let SweepOutcome::Completed(first) = first else {
            panic!("sweep was skipped");
        };
        assert_eq!(first.created, 2);
        assert_eq!(db.count_posts().await.unwrap(), 2);

        let second = orchestrator.run_sweep(60).await;
        let SweepOutcome::Completed(second) = second else {
            panic!("sweep was skipped");
        };
        assert_eq!(second.created, 0);
        assert_eq!(second.processed, 2);
        assert_eq!(db.count_posts().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn scan_stops_at_first_pre_window_item() {
        let mut source = StubSource::new();
        // Newest-first: two in window, one past the cutoff, one more
        // behind it that must never be fetched.
        source.push_story(40, "Fresh story number one here", "alice", 5, None);
        source.push_story(30, "Fresh story number two here", "alice", 30, None);
        source.push_story(20, "Stale story beyond the window", "alice", 120, None);
        source.push_story(10, "Never even fetched from the API", "alice", 180, None);
        source.push_user("alice", 10, None);

        let (orchestrator, db, source) = build(source).await;
        let outcome = orchestrator.run_sweep(60).await;

        let SweepOutcome::Completed(summary) = outcome else {
            panic!("sweep was skipped");
        };
        assert_eq!(summary.created, 2);

        let calls = source.item_calls.load(Ordering::SeqCst);
        assert_eq!(calls, 3, "scan must stop before fetching older ids");

        assert!(db.find_post_by_hn_id(40).await.unwrap().is_some());
        assert!(db.find_post_by_hn_id(30).await.unwrap().is_some());
        assert!(db.find_post_by_hn_id(20).await.unwrap().is_none());
        assert!(db.find_post_by_hn_id(10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn gem_classification_flows_through_the_sweep() {
        let mut source = StubSource::new();
        source.push_story_with(
            50,
            "Show HN: my tiny tool",
            "newbie",
            5,
            Some("https://github.com/newbie/tiny-tool"),
            Some("I built this around a neat algorithm"),
        );
        source.push_story_with(
            51,
            "Show HN: my other tiny utility",
            "veteran",
            5,
            Some("https://github.com/veteran/utility"),
            Some("I wrote this faster replacement tool"),
        );
        source.push_user("newbie", 10, None);
        source.push_user("veteran", 5000, None);

        let (orchestrator, db, _source) = build(source).await;
        orchestrator.run_sweep(60).await;

        let gem = db.find_post_by_hn_id(50).await.unwrap().unwrap();
        assert!(gem.is_hidden_gem);
        assert!(!gem.is_spam);

        let overlooked = db.find_post_by_hn_id(51).await.unwrap().unwrap();
        assert!(!overlooked.is_hidden_gem, "high-karma author is not a gem");
    }

    #[tokio::test]
    async fn spammy_post_is_flagged_not_gem() {
        let mut source = StubSource::new();
        source.push_story_with(
            60,
            "GET RICH NOW!!! FREE CRYPTO NFT",
            "spammer",
            1,
            Some("https://bit.ly/abc"),
            Some("earn money fast $$$ click here, limited time, act now"),
        );
        source.push_user("spammer", 1, None);

        let (orchestrator, db, _source) = build(source).await;
        orchestrator.run_sweep(60).await;

        let post = db.find_post_by_hn_id(60).await.unwrap().unwrap();
        assert!(post.is_spam);
        assert!(!post.is_hidden_gem);
    }

    #[tokio::test]
    async fn duplicate_submission_is_forced_to_spam() {
        let mut source = StubSource::new();
        source.push_story_with(
            70,
            "My static site generator",
            "original",
            30,
            Some("https://example.com/ssg"),
            None,
        );
        source.push_story_with(
            71,
            "My static site generator",
            "copycat",
            5,
            Some("https://example.com/ssg?utm_source=twitter"),
            None,
        );
        source.push_user("original", 10, None);
        source.push_user("copycat", 10, None);

        let (orchestrator, db, _source) = build(source).await;
        orchestrator.run_sweep(60).await;

        let original = db.find_post_by_hn_id(70).await.unwrap().unwrap();
        assert!(!original.is_spam);

        let copy = db.find_post_by_hn_id(71).await.unwrap().unwrap();
        assert!(copy.is_spam, "tracking-param copy must be caught");
        assert!(!copy.is_hidden_gem);
    }

    #[tokio::test]
    async fn untitled_and_non_story_items_are_skipped() {
        let mut source = StubSource::new();
        source.push_story(80, "", "alice", 5, None);
        let mut comment = hn_client::HnItem {
            id: 81,
            item_type: Some("comment".to_string()),
            by: Some("alice".to_string()),
            ..Default::default()
        };
        comment.time = Some(Utc::now().timestamp());
        source.ids.push(81);
        source.items.insert(81, comment);
        source.push_user("alice", 10, None);

        let (orchestrator, db, _source) = build(source).await;
        let SweepOutcome::Completed(summary) = orchestrator.run_sweep(60).await else {
            panic!("sweep was skipped");
        };
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.created, 0);
        assert_eq!(summary.errors, 0);
        assert_eq!(db.count_posts().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn overlapping_sweep_is_dropped_not_queued() {
        let mut source = StubSource::new();
        source.push_story(90, "A perfectly ordinary story", "alice", 5, None);
        source.push_user("alice", 10, None);
        source.item_delay = Some(std::time::Duration::from_millis(200));

        let (orchestrator, _db, _source) = build(source).await;

        let first = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.run_sweep(60).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let second = orchestrator.run_sweep(60).await;
        assert_eq!(second, SweepOutcome::Skipped);

        let first = first.await.unwrap();
        assert!(matches!(first, SweepOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn sweep_updates_running_counters() {
        let mut source = StubSource::new();
        source.push_story(95, "A perfectly ordinary story", "alice", 5, None);
        source.push_user("alice", 10, None);

        let (orchestrator, _db, _source) = build(source).await;
        orchestrator.run_sweep(60).await;

        let stats = orchestrator.stats().await;
        assert_eq!(stats.total_runs, 1);
        assert_eq!(stats.posts_collected, 1);
        assert!(stats.last_run.is_some());
        assert!(stats.last_duration_secs.is_some());
        assert_eq!(stats.state, JobState::Running);
    }
}
