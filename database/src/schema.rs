use crate::map_sqlx;
use gemscout_core::CoreError;
use sqlx::SqlitePool;
use tracing::debug;

/// Idempotent table and index creation, run at every startup.
pub(crate) async fn init_tables(pool: &SqlitePool) -> Result<(), CoreError> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await
        .map_err(map_sqlx)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            hn_id INTEGER UNIQUE NOT NULL,
            title TEXT NOT NULL,
            url TEXT,
            text TEXT,
            author TEXT NOT NULL,
            author_karma INTEGER NOT NULL DEFAULT 0,
            account_age_days INTEGER NOT NULL DEFAULT 0,
            score INTEGER NOT NULL DEFAULT 0,
            descendants INTEGER NOT NULL DEFAULT 0,
            hn_created_at TEXT NOT NULL,
            discovered_at TEXT NOT NULL,
            updated_at TEXT,
            is_hidden_gem INTEGER NOT NULL DEFAULT 0,
            is_spam INTEGER NOT NULL DEFAULT 0,
            current_hn_score INTEGER NOT NULL DEFAULT 0,
            last_checked_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(map_sqlx)?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author)")
        .execute(pool)
        .await
        .map_err(map_sqlx)?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_is_hidden_gem ON posts(is_hidden_gem)")
        .execute(pool)
        .await
        .map_err(map_sqlx)?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_discovered_at ON posts(discovered_at)")
        .execute(pool)
        .await
        .map_err(map_sqlx)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            karma INTEGER NOT NULL DEFAULT 0,
            hn_created_at TEXT,
            first_seen_at TEXT NOT NULL,
            updated_at TEXT,
            total_posts INTEGER NOT NULL DEFAULT 0,
            hidden_gems_count INTEGER NOT NULL DEFAULT 0,
            hall_of_fame_count INTEGER NOT NULL DEFAULT 0,
            last_checked_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(map_sqlx)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quality_scores (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id INTEGER UNIQUE NOT NULL REFERENCES posts(id),
            technical_depth REAL NOT NULL DEFAULT 0.0,
            originality REAL NOT NULL DEFAULT 0.0,
            problem_solving REAL NOT NULL DEFAULT 0.0,
            spam_likelihood REAL NOT NULL DEFAULT 0.0,
            overall_interest REAL NOT NULL DEFAULT 0.0,
            code_host_reputation REAL NOT NULL DEFAULT 0.0,
            domain_reputation REAL NOT NULL DEFAULT 0.0,
            analyzer_version TEXT NOT NULL DEFAULT '1.0',
            analyzed_at TEXT NOT NULL,
            analysis_time_ms INTEGER,
            manual_override INTEGER NOT NULL DEFAULT 0,
            manual_score REAL,
            manual_notes TEXT,
            manual_updated_by TEXT,
            manual_updated_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(map_sqlx)?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_quality_scores_overall ON quality_scores(overall_interest)",
    )
    .execute(pool)
    .await
    .map_err(map_sqlx)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS hall_of_fame (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id INTEGER UNIQUE NOT NULL REFERENCES posts(id),
            discovered_at TEXT NOT NULL,
            discovery_score REAL NOT NULL,
            discovery_hn_score INTEGER NOT NULL DEFAULT 0,
            discovery_karma INTEGER NOT NULL DEFAULT 0,
            hn_age_at_discovery_hours REAL,
            success_at TEXT,
            success_hn_score INTEGER,
            peak_hn_score INTEGER NOT NULL DEFAULT 0,
            success_threshold INTEGER NOT NULL DEFAULT 100,
            lead_time_hours REAL,
            success_tier TEXT,
            success_verified INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(map_sqlx)?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_hall_of_fame_success_at ON hall_of_fame(success_at)")
        .execute(pool)
        .await
        .map_err(map_sqlx)?;

    debug!("Database tables initialized (posts, users, quality_scores, hall_of_fame)");
    Ok(())
}
