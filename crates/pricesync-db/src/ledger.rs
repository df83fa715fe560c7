//! The `pipeline_stages` process ledger.
//!
//! One row per [`PipelineStage`]; rows are upserted, never duplicated. A
//! missing row means the stage has never run.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pricesync_core::{PipelineStage, StageStatus};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `pipeline_stages` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRow {
    pub stage: PipelineStage,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

/// Status of one stage, including stages with no ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: PipelineStage,
    pub status: StageStatus,
    pub updated_at: Option<DateTime<Utc>>,
}

/// `true` iff the stage has a row with `completed = true`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn is_stage_completed(pool: &PgPool, stage: PipelineStage) -> Result<bool, DbError> {
    let completed = sqlx::query_scalar::<_, bool>(
        "SELECT completed FROM pipeline_stages WHERE stage = $1",
    )
    .bind(stage.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(completed.unwrap_or(false))
}

/// Record the stage as completed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn mark_stage_completed(pool: &PgPool, stage: PipelineStage) -> Result<(), DbError> {
    set_stage(pool, stage, true).await
}

/// Record the stage as not completed, so the next run repeats it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn mark_stage_not_completed(pool: &PgPool, stage: PipelineStage) -> Result<(), DbError> {
    set_stage(pool, stage, false).await
}

async fn set_stage(pool: &PgPool, stage: PipelineStage, completed: bool) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO pipeline_stages (stage, completed, updated_at) \
         VALUES ($1, $2, NOW()) \
         ON CONFLICT (stage) DO UPDATE SET \
             completed  = EXCLUDED.completed, \
             updated_at = NOW()",
    )
    .bind(stage.as_str())
    .bind(completed)
    .execute(pool)
    .await?;
    Ok(())
}

/// Every ledger row, ordered by stage name.
///
/// # Errors
///
/// Returns [`DbError::UnknownStage`] if a row names a stage this build does
/// not know, or [`DbError::Sqlx`] if the query fails.
pub async fn list_stages(pool: &PgPool) -> Result<Vec<StageRow>, DbError> {
    let rows: Vec<(String, bool, DateTime<Utc>)> = sqlx::query_as(
        "SELECT stage, completed, updated_at FROM pipeline_stages ORDER BY stage",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(stage, completed, updated_at)| {
            let stage = stage
                .parse::<PipelineStage>()
                .map_err(|_| DbError::UnknownStage(stage.clone()))?;
            Ok(StageRow {
                stage,
                completed,
                updated_at,
            })
        })
        .collect()
}

/// Status of every known stage, in [`PipelineStage::ALL`] order.
///
/// # Errors
///
/// Propagates errors from [`list_stages`].
pub async fn stage_report(pool: &PgPool) -> Result<Vec<StageReport>, DbError> {
    let rows: HashMap<PipelineStage, StageRow> = list_stages(pool)
        .await?
        .into_iter()
        .map(|row| (row.stage, row))
        .collect();

    Ok(PipelineStage::ALL
        .into_iter()
        .map(|stage| {
            let row = rows.get(&stage);
            StageReport {
                stage,
                status: StageStatus::from_row(row.map(|r| (r.completed, r.updated_at))),
                updated_at: row.map(|r| r.updated_at),
            }
        })
        .collect())
}
