use crate::{map_sqlx, Database};
use chrono::{DateTime, TimeZone, Utc};
use gemscout_core::{CoreError, Post, QualityScores};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

/// Filters for the "current gems" query exposed to the presentation
/// layer.
#[derive(Debug, Clone)]
pub struct GemFilter {
    pub karma_ceiling: i64,
    pub min_score: f64,
    pub discovered_since: Option<DateTime<Utc>>,
    pub limit: i64,
}

impl Default for GemFilter {
    fn default() -> Self {
        Self {
            karma_ceiling: 100,
            min_score: 0.3,
            discovered_since: None,
            limit: 50,
        }
    }
}

pub(crate) fn post_from_row(row: &SqliteRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: Some(row.try_get("id")?),
        hn_id: row.try_get("hn_id")?,
        title: row.try_get("title")?,
        url: row.try_get("url")?,
        text: row.try_get("text")?,
        author: row.try_get("author")?,
        author_karma: row.try_get("author_karma")?,
        account_age_days: row.try_get("account_age_days")?,
        score: row.try_get("score")?,
        descendants: row.try_get("descendants")?,
        hn_created_at: row.try_get("hn_created_at")?,
        discovered_at: row.try_get("discovered_at")?,
        updated_at: row.try_get("updated_at")?,
        is_hidden_gem: row.try_get("is_hidden_gem")?,
        is_spam: row.try_get("is_spam")?,
        current_hn_score: row.try_get("current_hn_score")?,
        last_checked_at: row.try_get("last_checked_at")?,
    })
}

const POST_COLUMNS: &str = "id, hn_id, title, url, text, author, author_karma, \
     account_age_days, score, descendants, hn_created_at, discovered_at, updated_at, \
     is_hidden_gem, is_spam, current_hn_score, last_checked_at";

impl Database {
    pub async fn find_post_by_hn_id(&self, hn_id: i64) -> Result<Option<Post>, CoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE hn_id = ?",
            POST_COLUMNS
        ))
        .bind(hn_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;

        match row {
            Some(row) => Ok(Some(post_from_row(&row).map_err(map_sqlx)?)),
            None => Ok(None),
        }
    }

    /// Persist a post and its quality scores in one item-scoped
    /// transaction. A unique violation on `hn_id` (another path inserted
    /// the same story concurrently) surfaces as an error for which
    /// [`CoreError::is_benign_race`] is true.
    pub async fn insert_post_with_scores(
        &self,
        post: &Post,
        scores: &QualityScores,
        analyzed_at: DateTime<Utc>,
        analysis_time_ms: Option<i64>,
    ) -> Result<i64, CoreError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx)?;

        let result = sqlx::query(
            r#"
            INSERT INTO posts (
                hn_id, title, url, text, author, author_karma, account_age_days,
                score, descendants, hn_created_at, discovered_at,
                is_hidden_gem, is_spam, current_hn_score
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(post.hn_id)
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.text)
        .bind(&post.author)
        .bind(post.author_karma)
        .bind(post.account_age_days)
        .bind(post.score)
        .bind(post.descendants)
        .bind(post.hn_created_at)
        .bind(post.discovered_at)
        .bind(post.is_hidden_gem)
        .bind(post.is_spam)
        .bind(post.current_hn_score)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        let post_id = result.last_insert_rowid();

        sqlx::query(
            r#"
            INSERT INTO quality_scores (
                post_id, technical_depth, originality, problem_solving,
                spam_likelihood, overall_interest, code_host_reputation,
                domain_reputation, analyzed_at, analysis_time_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(post_id)
        .bind(scores.technical_depth)
        .bind(scores.originality)
        .bind(scores.problem_solving)
        .bind(scores.spam_likelihood)
        .bind(scores.overall_interest)
        .bind(scores.code_host_reputation)
        .bind(scores.domain_reputation)
        .bind(analyzed_at)
        .bind(analysis_time_ms)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        debug!("Persisted post {} (id {})", post.hn_id, post_id);
        Ok(post_id)
    }

    /// Refresh the live metrics the success monitor tracks.
    pub async fn update_post_live_metrics(
        &self,
        post_id: i64,
        current_hn_score: i64,
        descendants: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            UPDATE posts
            SET current_hn_score = ?, descendants = ?, last_checked_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(current_hn_score)
        .bind(descendants)
        .bind(now)
        .bind(now)
        .bind(post_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    /// Explicit content refresh from live data. The only path that
    /// mutates title/url/text after first observation.
    pub async fn refresh_post_content(
        &self,
        post_id: i64,
        title: &str,
        url: Option<&str>,
        text: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        sqlx::query(
            "UPDATE posts SET title = ?, url = ?, text = ?, updated_at = ? WHERE id = ?",
        )
        .bind(title)
        .bind(url)
        .bind(text)
        .bind(now)
        .bind(post_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    /// Duplicate-detector override: force spam, clear the gem flag.
    pub async fn mark_post_spam(&self, post_id: i64, now: DateTime<Utc>) -> Result<(), CoreError> {
        sqlx::query(
            "UPDATE posts SET is_spam = 1, is_hidden_gem = 0, updated_at = ? WHERE id = ?",
        )
        .bind(now)
        .bind(post_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    /// Gems that still look good: flagged, not spam, author under the
    /// karma ceiling, score above the floor, optionally discovered
    /// recently. Ordered best-first.
    pub async fn list_gems(&self, filter: &GemFilter) -> Result<Vec<Post>, CoreError> {
        // Epoch stands in for "no window"; nothing in the store predates it.
        let since = filter
            .discovered_since
            .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap());

        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM posts p
            JOIN quality_scores q ON q.post_id = p.id
            WHERE p.is_hidden_gem = 1
              AND p.is_spam = 0
              AND p.author_karma < ?
              AND q.overall_interest >= ?
              AND p.discovered_at >= ?
            ORDER BY q.overall_interest DESC
            LIMIT ?
            "#,
            POST_COLUMNS
                .split(", ")
                .map(|c| format!("p.{}", c))
                .collect::<Vec<_>>()
                .join(", ")
        ))
        .bind(filter.karma_ceiling)
        .bind(filter.min_score)
        .bind(since)
        .bind(filter.limit)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx)?;

        rows.iter()
            .map(|row| post_from_row(row).map_err(map_sqlx))
            .collect()
    }

    /// Every post still flagged as a gem and not spam; the success
    /// monitor's working set.
    pub async fn list_gem_posts(&self) -> Result<Vec<Post>, CoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE is_hidden_gem = 1 AND is_spam = 0",
            POST_COLUMNS
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx)?;

        rows.iter()
            .map(|row| post_from_row(row).map_err(map_sqlx))
            .collect()
    }

    /// Candidate set for duplicate detection against a new post: same
    /// author or same URL host, recently discovered. Bounded so the
    /// pairwise comparison stays cheap.
    pub async fn duplicate_candidates(
        &self,
        author: &str,
        url_host: Option<&str>,
        discovered_since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Post>, CoreError> {
        let host_pattern = url_host.map(|h| format!("%{}%", h));

        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM posts
            WHERE (author = ? OR (? IS NOT NULL AND url LIKE ?))
              AND discovered_at >= ?
            ORDER BY discovered_at DESC
            LIMIT ?
            "#,
            POST_COLUMNS
        ))
        .bind(author)
        .bind(&host_pattern)
        .bind(&host_pattern)
        .bind(discovered_since)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx)?;

        rows.iter()
            .map(|row| post_from_row(row).map_err(map_sqlx))
            .collect()
    }

    pub async fn count_posts(&self) -> Result<i64, CoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM posts")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx)?;
        row.try_get("n").map_err(map_sqlx)
    }
}
