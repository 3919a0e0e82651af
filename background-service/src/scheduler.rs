use crate::monitor::SuccessMonitor;
use crate::status::{MonitorStats, SweepStats};
use crate::sweep::SweepOrchestrator;
use gemscout_core::Config;
use hn_client::{ApiMetrics, HnClient};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

/// Snapshot of both jobs plus the API client counters, serializable for
/// the status query.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub sweep_enabled: bool,
    pub sweep_interval_minutes: u64,
    pub success_check_enabled: bool,
    pub success_check_interval_hours: u64,
    pub sweep: SweepStats,
    pub monitor: MonitorStats,
    pub api: Option<ApiMetrics>,
}

/// Owns the periodic triggers. Each job type runs on its own interval
/// inside its own task; overlap protection lives in the jobs themselves
/// (single-flight guards), so a slow run simply causes the next tick's
/// invocation to drop out.
pub struct Scheduler {
    orchestrator: Arc<SweepOrchestrator>,
    monitor: Arc<SuccessMonitor>,
    client: Option<Arc<HnClient>>,
    config: Config,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(
        orchestrator: Arc<SweepOrchestrator>,
        monitor: Arc<SuccessMonitor>,
        client: Option<Arc<HnClient>>,
        config: Config,
    ) -> Self {
        Self {
            orchestrator,
            monitor,
            client,
            config,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the periodic jobs. An interval of zero disables a job.
    pub async fn start(&self) {
        let mut handles = self.handles.lock().await;

        if self.config.sweep_interval_minutes > 0 {
            let orchestrator = self.orchestrator.clone();
            let window = self.config.ingest_window_minutes;
            let period = Duration::from_secs(self.config.sweep_interval_minutes * 60);
            info!(
                "Scheduled post sweep every {} minutes",
                self.config.sweep_interval_minutes
            );
            handles.push(tokio::spawn(async move {
                let mut ticks = interval_at(Instant::now() + period, period);
                ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticks.tick().await;
                    orchestrator.run_sweep(window).await;
                }
            }));
        } else {
            info!("Post sweep disabled (interval = 0)");
        }

        if self.config.success_check_interval_hours > 0 {
            let monitor = self.monitor.clone();
            let period = Duration::from_secs(self.config.success_check_interval_hours * 3600);
            info!(
                "Scheduled Hall of Fame monitoring every {} hours",
                self.config.success_check_interval_hours
            );
            handles.push(tokio::spawn(async move {
                let mut ticks = interval_at(Instant::now() + period, period);
                ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticks.tick().await;
                    monitor.run_check().await;
                }
            }));
        } else {
            info!("Hall of Fame monitoring disabled (interval = 0)");
        }
    }

    /// Fire one sweep immediately, off the caller's task. The sweep's
    /// own guard drops the invocation if one is already in flight.
    pub fn trigger_sweep_now(&self, minutes_back: u64) -> JoinHandle<()> {
        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            orchestrator.run_sweep(minutes_back).await;
        })
    }

    pub async fn status(&self) -> SchedulerStatus {
        let api = match &self.client {
            Some(client) => Some(client.metrics().await),
            None => None,
        };
        SchedulerStatus {
            sweep_enabled: self.config.sweep_interval_minutes > 0,
            sweep_interval_minutes: self.config.sweep_interval_minutes,
            success_check_enabled: self.config.success_check_interval_hours > 0,
            success_check_interval_hours: self.config.success_check_interval_hours,
            sweep: self.orchestrator.stats().await,
            monitor: self.monitor.stats().await,
            api,
        }
    }

    /// Best-effort shutdown: abort the periodic tasks. In-flight
    /// per-item work may be lost; committed items stay committed.
    pub async fn shutdown(&self) {
        let mut handles = self.handles.lock().await;
        for handle in handles.drain(..) {
            handle.abort();
        }
        info!("Scheduler stopped");
    }
}
