use pricesync_core::PipelineStage;

/// Print every stage, whether or not it has a ledger row.
///
/// # Errors
///
/// Returns an error if the ledger query fails.
pub(crate) async fn run_ledger_status(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let report = pricesync_db::stage_report(pool).await?;

    println!("{:<18}{:<13}UPDATED", "STAGE", "STATUS");
    for row in &report {
        let updated = row.updated_at.map_or_else(
            || "-".to_string(),
            |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        println!("{:<18}{:<13}{updated}", row.stage.as_str(), row.status.as_str());
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the ledger write fails.
pub(crate) async fn run_ledger_reset(
    pool: &sqlx::PgPool,
    stage: PipelineStage,
) -> anyhow::Result<()> {
    pricesync_db::mark_stage_not_completed(pool, stage).await?;
    println!("{stage} marked not completed");
    Ok(())
}
