use std::sync::Arc;

use pricesync_core::{AppConfig, PipelineStage};
use pricesync_pipeline::{run_bootstrap, run_refresh, Fetcher, RunOutcome};
use pricesync_scraper::default_drivers;
use sqlx::PgPool;
use tokio::task::JoinHandle;

/// Run the bootstrap in the background. Failures are logged; the ledger keeps
/// whatever stages completed.
pub fn spawn_bootstrap(pool: PgPool, config: Arc<AppConfig>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let fetcher = match Fetcher::from_config(&config) {
            Ok(fetcher) => fetcher,
            Err(e) => {
                tracing::error!(error = %e, "bootstrap: failed to build HTTP clients");
                return;
            }
        };
        let mut drivers = default_drivers(&config.sources);

        match run_bootstrap(&pool, &config, &fetcher, &mut drivers).await {
            Ok(RunOutcome::Completed) => tracing::info!("bootstrap: initial load complete"),
            Ok(RunOutcome::AlreadyCompleted) => tracing::info!("bootstrap: initial load already done"),
            Ok(RunOutcome::Locked) => tracing::warn!("bootstrap: skipped, another run holds the lock"),
            Err(e) => tracing::error!(error = %e, "bootstrap: failed"),
        }
    })
}

/// One scheduled refresh. Never propagates: errors end up in the log and the
/// `PRICE_UPDATE` ledger row.
pub(super) async fn scheduled_refresh(pool: &PgPool, config: &AppConfig) {
    match pricesync_db::is_stage_completed(pool, PipelineStage::InitialLoad).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!("scheduler: initial load not finished, skipping refresh");
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: ledger unavailable, skipping refresh");
            return;
        }
    }

    let fetcher = match Fetcher::from_config(config) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to build HTTP clients");
            return;
        }
    };
    let mut drivers = default_drivers(&config.sources);

    match run_refresh(pool, config, &fetcher, &mut drivers).await {
        Ok(outcome) => tracing::info!(?outcome, "scheduler: price refresh finished"),
        Err(e) => tracing::error!(error = %e, "scheduler: price refresh failed"),
    }
}
