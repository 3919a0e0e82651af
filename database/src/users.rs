use crate::{map_sqlx, Database};
use chrono::{DateTime, Utc};
use gemscout_core::{CoreError, User};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: Some(row.try_get("id")?),
        username: row.try_get("username")?,
        karma: row.try_get("karma")?,
        hn_created_at: row.try_get("hn_created_at")?,
        first_seen_at: row.try_get("first_seen_at")?,
        updated_at: row.try_get("updated_at")?,
        total_posts: row.try_get("total_posts")?,
        hidden_gems_count: row.try_get("hidden_gems_count")?,
        hall_of_fame_count: row.try_get("hall_of_fame_count")?,
        last_checked_at: row.try_get("last_checked_at")?,
    })
}

impl Database {
    pub async fn find_user(&self, username: &str) -> Result<Option<User>, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, karma, hn_created_at, first_seen_at, updated_at,
                   total_posts, hidden_gems_count, hall_of_fame_count, last_checked_at
            FROM users WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;

        match row {
            Some(row) => Ok(Some(user_from_row(&row).map_err(map_sqlx)?)),
            None => Ok(None),
        }
    }

    /// Create or refresh the author row whenever we see them. Karma and
    /// join date come from the live profile; aggregate counts are left
    /// to [`Database::refresh_user_stats`].
    pub async fn upsert_user(
        &self,
        username: &str,
        karma: i64,
        hn_created_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (username, karma, hn_created_at, first_seen_at, last_checked_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(username) DO UPDATE SET
                karma = excluded.karma,
                hn_created_at = COALESCE(excluded.hn_created_at, users.hn_created_at),
                last_checked_at = excluded.last_checked_at,
                updated_at = excluded.last_checked_at
            "#,
        )
        .bind(username)
        .bind(karma)
        .bind(hn_created_at)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    /// Recompute the aggregate counts from the posts and hall_of_fame
    /// tables. Counting from scratch is cheap at this scale and cannot
    /// drift the way incremental updates do.
    pub async fn refresh_user_stats(&self, username: &str) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            UPDATE users SET
                total_posts = (SELECT COUNT(*) FROM posts WHERE author = users.username),
                hidden_gems_count = (
                    SELECT COUNT(*) FROM posts
                    WHERE author = users.username AND is_hidden_gem = 1
                ),
                hall_of_fame_count = (
                    SELECT COUNT(*) FROM hall_of_fame h
                    JOIN posts p ON p.id = h.post_id
                    WHERE p.author = users.username
                )
            WHERE username = ?
            "#,
        )
        .bind(username)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    /// Low-karma accounts that have produced multiple gems.
    pub async fn rising_stars(&self, limit: i64) -> Result<Vec<User>, CoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, karma, hn_created_at, first_seen_at, updated_at,
                   total_posts, hidden_gems_count, hall_of_fame_count, last_checked_at
            FROM users
            WHERE hidden_gems_count >= 2
            ORDER BY hall_of_fame_count DESC, hidden_gems_count DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx)?;

        rows.iter()
            .map(|row| user_from_row(row).map_err(map_sqlx))
            .collect()
    }
}
