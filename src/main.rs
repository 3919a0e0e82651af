use background_service::{Scheduler, SuccessMonitor, SweepOrchestrator};
use database::Database;
use gemscout_core::Config;
use hn_client::HnClient;
use quality_analyzer::{GithubRepoSignal, QualityAnalyzer};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemscout=info,background_service=info,hn_client=info".into()),
        )
        .init();

    tracing::info!("Starting gemscout - HN hidden gem finder");

    let config = Config::load()?;
    let db = Database::connect(&config.database_url).await?;

    let client = Arc::new(HnClient::from_config(&config));
    let repo_signal = Arc::new(GithubRepoSignal::new(&config.user_agent));
    let analyzer = QualityAnalyzer::with_repo_signal(repo_signal);

    let orchestrator = Arc::new(SweepOrchestrator::new(
        client.clone(),
        db.clone(),
        analyzer,
        config.clone(),
    ));
    let monitor = Arc::new(SuccessMonitor::new(
        client.clone(),
        db.clone(),
        config.success_score_threshold,
    ));

    let scheduler = Scheduler::new(orchestrator, monitor, Some(client), config.clone());
    scheduler.start().await;

    // Kick off an initial sweep so a fresh deployment has data before
    // the first scheduled tick.
    let _ = scheduler.trigger_sweep_now(config.ingest_window_minutes);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    scheduler.shutdown().await;

    Ok(())
}
