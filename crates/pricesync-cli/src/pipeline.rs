//! Foreground runs of the orchestrators the server schedules.

use pricesync_core::AppConfig;
use pricesync_pipeline::{run_bootstrap, run_refresh, Fetcher, RunOutcome};
use pricesync_scraper::default_drivers;

fn describe(outcome: RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Completed => "completed",
        RunOutcome::AlreadyCompleted => "already completed, nothing to do",
        RunOutcome::Locked => "skipped: another run holds the pipeline lock",
    }
}

/// # Errors
///
/// Returns the first failing stage's error; completed stages stay marked.
pub(crate) async fn run_pipeline_bootstrap(
    pool: &sqlx::PgPool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let fetcher = Fetcher::from_config(config)?;
    let mut drivers = default_drivers(&config.sources);

    let outcome = run_bootstrap(pool, config, &fetcher, &mut drivers)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "bootstrap failed"))?;
    println!("bootstrap {}", describe(outcome));
    Ok(())
}

/// # Errors
///
/// Returns the refresh error after `PRICE_UPDATE` has been reset.
pub(crate) async fn run_pipeline_refresh(
    pool: &sqlx::PgPool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let fetcher = Fetcher::from_config(config)?;
    let mut drivers = default_drivers(&config.sources);

    let outcome = run_refresh(pool, config, &fetcher, &mut drivers).await?;
    println!("refresh {}", describe(outcome));
    Ok(())
}
