use crate::{map_sqlx, Database};
use chrono::{DateTime, Utc};
use gemscout_core::CoreError;
use serde::{Deserialize, Serialize};
use sqlx::Row;

/// Post-level counts for the statistics surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostStats {
    pub total_posts: i64,
    pub hidden_gems: i64,
    pub spam_posts: i64,
    pub hall_of_fame_count: i64,
    /// Gems that went on to verified success, as a percentage.
    pub success_rate: f64,
    pub posts_last_24h: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreStats {
    pub total_analyzed: i64,
    pub avg_interest_score: f64,
    pub avg_spam_likelihood: f64,
    pub high_quality_count: i64,
    pub spam_count: i64,
    pub manual_overrides: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HallOfFameStats {
    pub total_entries: i64,
    pub verified_successes: i64,
    pub avg_lead_time_hours: f64,
    /// Entries discovered within six hours of the story appearing.
    pub early_discoveries: i64,
}

impl Database {
    pub async fn post_stats(&self, now: DateTime<Utc>) -> Result<PostStats, CoreError> {
        let day_ago = now - chrono::Duration::hours(24);
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_posts,
                COALESCE(SUM(is_hidden_gem), 0) AS hidden_gems,
                COALESCE(SUM(is_spam), 0) AS spam_posts,
                (SELECT COUNT(*) FROM hall_of_fame) AS hall_of_fame_count,
                COALESCE(SUM(CASE WHEN discovered_at >= ? THEN 1 ELSE 0 END), 0) AS posts_last_24h
            FROM posts
            "#,
        )
        .bind(day_ago)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx)?;

        let hidden_gems: i64 = row.try_get("hidden_gems").map_err(map_sqlx)?;
        let hall_of_fame_count: i64 = row.try_get("hall_of_fame_count").map_err(map_sqlx)?;
        let success_rate = if hidden_gems > 0 {
            hall_of_fame_count as f64 / hidden_gems as f64 * 100.0
        } else {
            0.0
        };

        Ok(PostStats {
            total_posts: row.try_get("total_posts").map_err(map_sqlx)?,
            hidden_gems,
            spam_posts: row.try_get("spam_posts").map_err(map_sqlx)?,
            hall_of_fame_count,
            success_rate,
            posts_last_24h: row.try_get("posts_last_24h").map_err(map_sqlx)?,
        })
    }

    pub async fn score_stats(&self) -> Result<ScoreStats, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_analyzed,
                COALESCE(AVG(overall_interest), 0.0) AS avg_interest,
                COALESCE(AVG(spam_likelihood), 0.0) AS avg_spam,
                COALESCE(SUM(CASE WHEN overall_interest >= 0.7 THEN 1 ELSE 0 END), 0) AS high_quality,
                COALESCE(SUM(CASE WHEN spam_likelihood >= 0.7 THEN 1 ELSE 0 END), 0) AS spam_count,
                COALESCE(SUM(manual_override), 0) AS manual_overrides
            FROM quality_scores
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx)?;

        Ok(ScoreStats {
            total_analyzed: row.try_get("total_analyzed").map_err(map_sqlx)?,
            avg_interest_score: row.try_get("avg_interest").map_err(map_sqlx)?,
            avg_spam_likelihood: row.try_get("avg_spam").map_err(map_sqlx)?,
            high_quality_count: row.try_get("high_quality").map_err(map_sqlx)?,
            spam_count: row.try_get("spam_count").map_err(map_sqlx)?,
            manual_overrides: row.try_get("manual_overrides").map_err(map_sqlx)?,
        })
    }

    pub async fn hof_stats(&self) -> Result<HallOfFameStats, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_entries,
                COALESCE(SUM(success_verified), 0) AS verified_successes,
                COALESCE(AVG(lead_time_hours), 0.0) AS avg_lead_time,
                COALESCE(SUM(CASE WHEN hn_age_at_discovery_hours < 6 THEN 1 ELSE 0 END), 0)
                    AS early_discoveries
            FROM hall_of_fame
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx)?;

        Ok(HallOfFameStats {
            total_entries: row.try_get("total_entries").map_err(map_sqlx)?,
            verified_successes: row.try_get("verified_successes").map_err(map_sqlx)?,
            avg_lead_time_hours: row.try_get("avg_lead_time").map_err(map_sqlx)?,
            early_discoveries: row.try_get("early_discoveries").map_err(map_sqlx)?,
        })
    }
}
