pub mod bootstrap;
pub mod classify;
pub mod error;
pub mod fetch;
pub mod images;
pub mod refresh;
pub mod seed;
pub mod workdir;

use std::future::Future;

use sqlx::PgPool;

pub use bootstrap::run_bootstrap;
pub use error::PipelineError;
pub use fetch::{download_and_convert, DriverFetch, FetchSummary, Fetcher};
pub use refresh::run_refresh;
pub use workdir::{clear_directory, collect_xml_files};

/// Advisory lock key shared by bootstrap and refresh ("pricesyn").
pub const PIPELINE_LOCK_KEY: i64 = 0x7072_6963_6573_796e;

/// How an orchestrator run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// The ledger already records the run as done.
    AlreadyCompleted,
    /// Another run holds [`PIPELINE_LOCK_KEY`].
    Locked,
}

/// Run `work` while holding the pipeline lock, or skip it when the lock is
/// taken.
async fn with_run_lock<F>(pool: &PgPool, run: &str, work: F) -> Result<RunOutcome, PipelineError>
where
    F: Future<Output = Result<RunOutcome, PipelineError>>,
{
    let Some(lock) = pricesync_db::try_acquire_run_lock(pool, PIPELINE_LOCK_KEY).await? else {
        tracing::warn!(run, "another pipeline run is in progress, skipping");
        return Ok(RunOutcome::Locked);
    };

    let result = work.await;
    if let Err(e) = lock.release().await {
        tracing::warn!(run, error = %e, "failed to release pipeline lock");
    }
    result
}
