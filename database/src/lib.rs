mod hall_of_fame;
mod posts;
mod quality_scores;
mod schema;
mod stats;
mod users;


pub use posts::GemFilter;
pub use stats::{HallOfFameStats, PostStats, ScoreStats};

use gemscout_core::{CoreError, DatabaseError};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

/// Typed access to the single SQLite store. One instance (one pool) is
/// shared by every job; SQLite's own unique constraints arbitrate
/// concurrent inserts.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the pool and create any missing tables.
    pub async fn connect(database_url: &str) -> Result<Self, CoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| {
                CoreError::Database(DatabaseError::ConnectionFailed {
                    reason: e.to_string(),
                })
            })?;

        let db = Self { pool };
        db.init_schema().await?;
        info!("Database ready at {}", database_url);
        Ok(db)
    }

    /// In-memory database for tests.
    pub async fn connect_in_memory() -> Result<Self, CoreError> {
        Self::connect("sqlite::memory:").await
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<(), CoreError> {
        schema::init_tables(&self.pool).await
    }
}

/// Map a low-level sqlx error, preserving unique-violation information
/// so callers can recognize benign insert races.
pub(crate) fn map_sqlx(err: sqlx::Error) -> CoreError {
    CoreError::Database(DatabaseError::Sql(err))
}
