use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a periodic job, as shown in the status surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Stopped,
    Running,
    Collecting,
    Errored,
}

/// Running counters for the ingestion sweep, kept across runs and
/// exposed for external inspection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepStats {
    pub last_run: Option<DateTime<Utc>>,
    pub last_duration_secs: Option<f64>,
    pub posts_processed: u64,
    pub posts_collected: u64,
    pub gems_found: u64,
    pub total_runs: u64,
    pub errors: u64,
    pub state: JobState,
}

/// Counters for the success-monitor job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorStats {
    pub last_run: Option<DateTime<Utc>>,
    pub last_duration_secs: Option<f64>,
    pub gems_monitored: u64,
    pub new_successes: u64,
    pub updated_entries: u64,
    pub total_runs: u64,
    pub errors: u64,
    pub state: JobState,
}
