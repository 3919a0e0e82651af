use crate::{map_sqlx, Database};
use chrono::{DateTime, TimeZone, Utc};
use gemscout_core::{CoreError, HallOfFameEntry, SuccessTier};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn entry_from_row(row: &SqliteRow) -> Result<HallOfFameEntry, sqlx::Error> {
    let tier: Option<String> = row.try_get("success_tier")?;
    Ok(HallOfFameEntry {
        id: Some(row.try_get("id")?),
        post_id: row.try_get("post_id")?,
        discovered_at: row.try_get("discovered_at")?,
        discovery_score: row.try_get("discovery_score")?,
        discovery_hn_score: row.try_get("discovery_hn_score")?,
        discovery_karma: row.try_get("discovery_karma")?,
        hn_age_at_discovery_hours: row.try_get("hn_age_at_discovery_hours")?,
        success_at: row.try_get("success_at")?,
        success_hn_score: row.try_get("success_hn_score")?,
        peak_hn_score: row.try_get("peak_hn_score")?,
        success_threshold: row.try_get("success_threshold")?,
        lead_time_hours: row.try_get("lead_time_hours")?,
        success_tier: tier.as_deref().and_then(SuccessTier::parse),
        success_verified: row.try_get("success_verified")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl Database {
    pub async fn find_hof_by_post_id(
        &self,
        post_id: i64,
    ) -> Result<Option<HallOfFameEntry>, CoreError> {
        let row = sqlx::query("SELECT * FROM hall_of_fame WHERE post_id = ?")
            .bind(post_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx)?;

        match row {
            Some(row) => Ok(Some(entry_from_row(&row).map_err(map_sqlx)?)),
            None => Ok(None),
        }
    }

    pub async fn insert_hof_entry(&self, entry: &HallOfFameEntry) -> Result<i64, CoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO hall_of_fame (
                post_id, discovered_at, discovery_score, discovery_hn_score,
                discovery_karma, hn_age_at_discovery_hours, success_at,
                success_hn_score, peak_hn_score, success_threshold,
                lead_time_hours, success_tier, success_verified, notes,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.post_id)
        .bind(entry.discovered_at)
        .bind(entry.discovery_score)
        .bind(entry.discovery_hn_score)
        .bind(entry.discovery_karma)
        .bind(entry.hn_age_at_discovery_hours)
        .bind(entry.success_at)
        .bind(entry.success_hn_score)
        .bind(entry.peak_hn_score)
        .bind(entry.success_threshold)
        .bind(entry.lead_time_hours)
        .bind(entry.success_tier.map(|t| t.as_str()))
        .bind(entry.success_verified)
        .bind(&entry.notes)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;

        Ok(result.last_insert_rowid())
    }

    /// Write back the mutable portion of an entry after a re-check.
    /// Success fields only ever go from NULL to set; the guard in
    /// [`HallOfFameEntry::observe_score`] enforces that before we get
    /// here.
    pub async fn update_hof_entry(&self, entry: &HallOfFameEntry) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            UPDATE hall_of_fame SET
                success_at = ?,
                success_hn_score = ?,
                peak_hn_score = ?,
                success_threshold = ?,
                lead_time_hours = ?,
                success_tier = ?,
                success_verified = ?,
                updated_at = ?
            WHERE post_id = ?
            "#,
        )
        .bind(entry.success_at)
        .bind(entry.success_hn_score)
        .bind(entry.peak_hn_score)
        .bind(entry.success_threshold)
        .bind(entry.lead_time_hours)
        .bind(entry.success_tier.map(|t| t.as_str()))
        .bind(entry.success_verified)
        .bind(entry.updated_at)
        .bind(entry.post_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    /// Hall of fame listing for the presentation layer.
    pub async fn list_hof_entries(
        &self,
        verified_only: bool,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<HallOfFameEntry>, CoreError> {
        // Epoch stands in for "no window"; nothing in the store predates it.
        let since = since.unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap());
        let rows = sqlx::query(
            r#"
            SELECT * FROM hall_of_fame
            WHERE (? = 0 OR success_verified = 1)
              AND created_at >= ?
            ORDER BY success_at DESC, created_at DESC
            LIMIT ?
            "#,
        )
        .bind(verified_only)
        .bind(since)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx)?;

        rows.iter()
            .map(|row| entry_from_row(row).map_err(map_sqlx))
            .collect()
    }
}
