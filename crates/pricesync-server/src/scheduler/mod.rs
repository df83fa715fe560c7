//! Background job scheduler.
//!
//! The daily price refresh runs on the configured cron expression. The
//! one-time bootstrap is started once at startup, outside the scheduler.

mod pipeline;

use std::future::Future;
use std::sync::Arc;

use pricesync_core::AppConfig;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

pub use pipeline::spawn_bootstrap;

/// Builds and starts the background job scheduler.
///
/// The returned [`JobScheduler`] must be kept alive for the lifetime of the
/// process; dropping it stops every job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// refresh cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let cron = config.refresh_cron.clone();
    let job = cron_job(&cron, move || {
        let pool = pool.clone();
        let config = Arc::clone(&config);
        async move {
            tracing::info!("scheduler: starting price refresh");
            pipeline::scheduled_refresh(&pool, &config).await;
        }
    })?;
    scheduler.add(job).await?;

    scheduler.start().await?;
    tracing::info!(cron = %cron, "scheduler: price refresh registered");
    Ok(scheduler)
}

/// A job running `run` on every tick of `cron`.
fn cron_job<F, Fut>(cron: &str, run: F) -> Result<Job, JobSchedulerError>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Job::new_async(cron, move |_uuid, _lock| Box::pin(run()))
}
