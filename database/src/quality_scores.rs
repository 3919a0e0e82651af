use crate::{map_sqlx, Database};
use chrono::{DateTime, Utc};
use gemscout_core::{CoreError, QualityScoreRecord, QualityScores};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn record_from_row(row: &SqliteRow) -> Result<QualityScoreRecord, sqlx::Error> {
    Ok(QualityScoreRecord {
        id: Some(row.try_get("id")?),
        post_id: row.try_get("post_id")?,
        scores: QualityScores {
            technical_depth: row.try_get("technical_depth")?,
            originality: row.try_get("originality")?,
            problem_solving: row.try_get("problem_solving")?,
            spam_likelihood: row.try_get("spam_likelihood")?,
            overall_interest: row.try_get("overall_interest")?,
            code_host_reputation: row.try_get("code_host_reputation")?,
            domain_reputation: row.try_get("domain_reputation")?,
        },
        analyzer_version: row.try_get("analyzer_version")?,
        analyzed_at: row.try_get("analyzed_at")?,
        analysis_time_ms: row.try_get("analysis_time_ms")?,
        manual_override: row.try_get("manual_override")?,
        manual_score: row.try_get("manual_score")?,
        manual_notes: row.try_get("manual_notes")?,
        manual_updated_by: row.try_get("manual_updated_by")?,
        manual_updated_at: row.try_get("manual_updated_at")?,
    })
}

impl Database {
    pub async fn find_scores_by_post_id(
        &self,
        post_id: i64,
    ) -> Result<Option<QualityScoreRecord>, CoreError> {
        let row = sqlx::query("SELECT * FROM quality_scores WHERE post_id = ?")
            .bind(post_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx)?;

        match row {
            Some(row) => Ok(Some(record_from_row(&row).map_err(map_sqlx)?)),
            None => Ok(None),
        }
    }

    /// Rescoring replaces the computed dimensions wholesale; manual
    /// override fields survive untouched.
    pub async fn replace_scores(
        &self,
        post_id: i64,
        scores: &QualityScores,
        analyzed_at: DateTime<Utc>,
        analysis_time_ms: Option<i64>,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            UPDATE quality_scores SET
                technical_depth = ?,
                originality = ?,
                problem_solving = ?,
                spam_likelihood = ?,
                overall_interest = ?,
                code_host_reputation = ?,
                domain_reputation = ?,
                analyzed_at = ?,
                analysis_time_ms = ?
            WHERE post_id = ?
            "#,
        )
        .bind(scores.technical_depth)
        .bind(scores.originality)
        .bind(scores.problem_solving)
        .bind(scores.spam_likelihood)
        .bind(scores.overall_interest)
        .bind(scores.code_host_reputation)
        .bind(scores.domain_reputation)
        .bind(analyzed_at)
        .bind(analysis_time_ms)
        .bind(post_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    /// Record a human judgement that short-circuits the computed score.
    pub async fn apply_manual_override(
        &self,
        post_id: i64,
        score: f64,
        notes: Option<&str>,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            UPDATE quality_scores SET
                manual_override = 1,
                manual_score = ?,
                manual_notes = ?,
                manual_updated_by = ?,
                manual_updated_at = ?
            WHERE post_id = ?
            "#,
        )
        .bind(score)
        .bind(notes)
        .bind(updated_by)
        .bind(now)
        .bind(post_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }
}
