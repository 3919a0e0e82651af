use crate::status::{JobState, MonitorStats};
use chrono::Utc;
use database::Database;
use gemscout_core::{CoreError, HallOfFameEntry, Post};
use hn_client::ItemSource;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    pub gems_checked: u64,
    pub new_successes: u64,
    pub updated_entries: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    Skipped,
    Completed(MonitorSummary),
}

/// What one gem re-check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GemCheck {
    /// Upstream has nothing for this id right now.
    Absent,
    /// Existing entry refreshed (peak tracking).
    EntryUpdated,
    /// First threshold crossing: permanent record created and verified.
    NewSuccess,
    /// Still below the success threshold, no entry yet.
    BelowThreshold,
}

/// Re-checks every flagged gem against its live score. The first time a
/// gem crosses the success threshold it gets a permanent Hall of Fame
/// entry with its success fields set; afterwards only the peak score
/// keeps moving.
pub struct SuccessMonitor {
    source: Arc<dyn ItemSource>,
    db: Database,
    success_threshold: i64,
    guard: Semaphore,
    stats: RwLock<MonitorStats>,
}

impl SuccessMonitor {
    pub fn new(source: Arc<dyn ItemSource>, db: Database, success_threshold: i64) -> Self {
        Self {
            source,
            db,
            success_threshold,
            guard: Semaphore::new(1),
            stats: RwLock::new(MonitorStats::default()),
        }
    }

    pub async fn stats(&self) -> MonitorStats {
        self.stats.read().await.clone()
    }

    pub async fn run_check(&self) -> MonitorOutcome {
        let _permit = match self.guard.try_acquire() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Success check already in progress, skipping");
                return MonitorOutcome::Skipped;
            }
        };

        let started = Utc::now();
        self.stats.write().await.state = JobState::Collecting;
        info!("Starting Hall of Fame monitoring");

        let gems = match self.db.list_gem_posts().await {
            Ok(gems) => gems,
            Err(e) => {
                error!("Failed to list gems for monitoring: {}", e);
                let mut stats = self.stats.write().await;
                stats.state = JobState::Errored;
                stats.errors += 1;
                return MonitorOutcome::Completed(MonitorSummary {
                    errors: 1,
                    ..MonitorSummary::default()
                });
            }
        };
        info!("Monitoring {} discovered gems for success", gems.len());

        let mut summary = MonitorSummary::default();
        for gem in &gems {
            summary.gems_checked += 1;
            match self.check_gem(gem).await {
                Ok(GemCheck::NewSuccess) => summary.new_successes += 1,
                Ok(GemCheck::EntryUpdated) => summary.updated_entries += 1,
                Ok(GemCheck::Absent) | Ok(GemCheck::BelowThreshold) => {}
                Err(e) => {
                    error!("Error monitoring gem {}: {}", gem.hn_id, e);
                    summary.errors += 1;
                }
            }
        }

        let duration_secs = (Utc::now() - started).num_milliseconds() as f64 / 1000.0;
        {
            let mut stats = self.stats.write().await;
            stats.last_run = Some(started);
            stats.last_duration_secs = Some(duration_secs);
            stats.gems_monitored += summary.gems_checked;
            stats.new_successes += summary.new_successes;
            stats.updated_entries += summary.updated_entries;
            stats.errors += summary.errors;
            stats.total_runs += 1;
            stats.state = JobState::Running;
        }

        info!(
            "Hall of Fame monitoring completed: {} new successes, {} updated, {} gems checked, {} errors",
            summary.new_successes, summary.updated_entries, summary.gems_checked, summary.errors
        );
        MonitorOutcome::Completed(summary)
    }

    async fn check_gem(&self, gem: &Post) -> Result<GemCheck, CoreError> {
        let post_id = gem.id.ok_or_else(|| CoreError::Internal {
            message: format!("gem {} has no row id", gem.hn_id),
        })?;

        let Some(item) = self.source.get_item(gem.hn_id).await else {
            debug!("Gem {} absent upstream, skipping", gem.hn_id);
            return Ok(GemCheck::Absent);
        };
        let current_score = item.score.unwrap_or(0);
        let descendants = item.descendants.unwrap_or(gem.descendants);
        let now = Utc::now();

        self.db
            .update_post_live_metrics(post_id, current_score, descendants, now)
            .await?;

        match self.db.find_hof_by_post_id(post_id).await? {
            Some(mut entry) => {
                entry.observe_score(current_score, self.success_threshold, now);
                self.db.update_hof_entry(&entry).await?;
                debug!(
                    "Updated HoF entry for {}: {} points (peak {})",
                    gem.hn_id, current_score, entry.peak_hn_score
                );
                Ok(GemCheck::EntryUpdated)
            }
            None if current_score >= self.success_threshold => {
                let discovery_score = self
                    .db
                    .find_scores_by_post_id(post_id)
                    .await?
                    .map(|record| record.effective_score())
                    .unwrap_or(0.0);

                let mut entry = HallOfFameEntry {
                    id: None,
                    post_id,
                    discovered_at: gem.discovered_at,
                    discovery_score,
                    discovery_hn_score: gem.score,
                    discovery_karma: gem.author_karma,
                    hn_age_at_discovery_hours: Some(gem.discovery_lag_hours()),
                    success_at: None,
                    success_hn_score: None,
                    peak_hn_score: gem.score,
                    success_threshold: self.success_threshold,
                    lead_time_hours: None,
                    success_tier: None,
                    success_verified: false,
                    notes: None,
                    created_at: now,
                    updated_at: None,
                };
                entry.observe_score(current_score, self.success_threshold, now);

                match self.db.insert_hof_entry(&entry).await {
                    Ok(_) => {}
                    Err(e) if e.is_benign_race() => {
                        debug!("HoF entry for {} already exists", gem.hn_id);
                        return Ok(GemCheck::EntryUpdated);
                    }
                    Err(e) => return Err(e),
                }

                if let Err(e) = self.db.refresh_user_stats(&gem.author).await {
                    warn!("Failed to refresh stats for {}: {}", gem.author, e);
                }
                info!(
                    "New success: {} reached {} points (discovered at {})",
                    gem.hn_id, current_score, gem.discovered_at
                );
                Ok(GemCheck::NewSuccess)
            }
            None => Ok(GemCheck::BelowThreshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubSource;
    use chrono::Duration;
    use gemscout_core::{QualityScores, SuccessTier};

    fn gem_scores() -> QualityScores {
        QualityScores {
            technical_depth: 0.5,
            originality: 0.8,
            problem_solving: 0.3,
            spam_likelihood: 0.1,
            overall_interest: 0.6,
            code_host_reputation: 0.0,
            domain_reputation: 0.8,
        }
    }

    async fn seed_gem(db: &Database, hn_id: i64) -> i64 {
        let now = Utc::now();
        let post = Post {
            id: None,
            hn_id,
            title: format!("Gem {}", hn_id),
            url: None,
            text: None,
            author: "alice".to_string(),
            author_karma: 12,
            account_age_days: 40,
            score: 4,
            descendants: 1,
            hn_created_at: now - Duration::hours(2),
            discovered_at: now - Duration::hours(1),
            updated_at: None,
            is_hidden_gem: true,
            is_spam: false,
            current_hn_score: 4,
            last_checked_at: None,
        };
        db.insert_post_with_scores(&post, &gem_scores(), now, None)
            .await
            .unwrap()
    }

    fn monitor_with_score(db: &Database, hn_id: i64, score: i64) -> SuccessMonitor {
        let mut source = StubSource::new();
        source.push_story(hn_id, "Gem story title goes here", "alice", 60, None);
        if let Some(item) = source.items.get_mut(&hn_id) {
            item.score = Some(score);
        }
        SuccessMonitor::new(Arc::new(source), db.clone(), 100)
    }

    #[tokio::test]
    async fn first_crossing_creates_verified_entry() {
        let db = Database::connect_in_memory().await.unwrap();
        let post_id = seed_gem(&db, 500).await;

        let monitor = monitor_with_score(&db, 500, 150);
        let MonitorOutcome::Completed(summary) = monitor.run_check().await else {
            panic!("check was skipped");
        };
        assert_eq!(summary.new_successes, 1);
        assert_eq!(summary.errors, 0);

        let entry = db.find_hof_by_post_id(post_id).await.unwrap().unwrap();
        assert!(entry.success_verified);
        assert_eq!(entry.success_hn_score, Some(150));
        assert_eq!(entry.peak_hn_score, 150);
        assert_eq!(entry.success_tier, Some(SuccessTier::Top100));
        assert_eq!(entry.discovery_hn_score, 4);
        assert!(entry.lead_time_hours.is_some());

        let post = db.find_post_by_hn_id(500).await.unwrap().unwrap();
        assert_eq!(post.current_hn_score, 150);
        assert!(post.last_checked_at.is_some());
    }

    #[tokio::test]
    async fn success_fields_survive_a_score_drop() {
        let db = Database::connect_in_memory().await.unwrap();
        let post_id = seed_gem(&db, 501).await;

        monitor_with_score(&db, 501, 150).run_check().await;
        let before = db.find_hof_by_post_id(post_id).await.unwrap().unwrap();

        let MonitorOutcome::Completed(summary) =
            monitor_with_score(&db, 501, 60).run_check().await
        else {
            panic!("check was skipped");
        };
        assert_eq!(summary.updated_entries, 1);
        assert_eq!(summary.new_successes, 0);

        let after = db.find_hof_by_post_id(post_id).await.unwrap().unwrap();
        assert_eq!(after.success_at, before.success_at);
        assert_eq!(after.success_hn_score, Some(150));
        assert_eq!(after.peak_hn_score, 150);
    }

    #[tokio::test]
    async fn later_spike_moves_only_the_peak() {
        let db = Database::connect_in_memory().await.unwrap();
        let post_id = seed_gem(&db, 502).await;

        monitor_with_score(&db, 502, 150).run_check().await;
        monitor_with_score(&db, 502, 600).run_check().await;

        let entry = db.find_hof_by_post_id(post_id).await.unwrap().unwrap();
        assert_eq!(entry.success_hn_score, Some(150));
        assert_eq!(entry.peak_hn_score, 600);
        // Tier reflects the first crossing, not the later spike.
        assert_eq!(entry.success_tier, Some(SuccessTier::Top100));
    }

    #[tokio::test]
    async fn below_threshold_gem_gets_no_entry_but_fresh_metrics() {
        let db = Database::connect_in_memory().await.unwrap();
        let post_id = seed_gem(&db, 503).await;

        let MonitorOutcome::Completed(summary) =
            monitor_with_score(&db, 503, 40).run_check().await
        else {
            panic!("check was skipped");
        };
        assert_eq!(summary.new_successes, 0);
        assert_eq!(summary.updated_entries, 0);
        assert_eq!(summary.gems_checked, 1);

        assert!(db.find_hof_by_post_id(post_id).await.unwrap().is_none());
        let post = db.find_post_by_hn_id(503).await.unwrap().unwrap();
        assert_eq!(post.current_hn_score, 40);
    }

    #[tokio::test]
    async fn absent_item_is_skipped_without_error() {
        let db = Database::connect_in_memory().await.unwrap();
        seed_gem(&db, 504).await;

        // Stub knows nothing about id 504.
        let monitor = SuccessMonitor::new(Arc::new(StubSource::new()), db.clone(), 100);
        let MonitorOutcome::Completed(summary) = monitor.run_check().await else {
            panic!("check was skipped");
        };
        assert_eq!(summary.gems_checked, 1);
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.new_successes, 0);
    }

    #[tokio::test]
    async fn spam_flagged_posts_are_not_monitored() {
        let db = Database::connect_in_memory().await.unwrap();
        let post_id = seed_gem(&db, 505).await;
        db.mark_post_spam(post_id, Utc::now()).await.unwrap();

        let MonitorOutcome::Completed(summary) =
            monitor_with_score(&db, 505, 500).run_check().await
        else {
            panic!("check was skipped");
        };
        assert_eq!(summary.gems_checked, 0);
        assert!(db.find_hof_by_post_id(post_id).await.unwrap().is_none());
    }
}
