/// # Errors
///
/// Returns an error if any migration fails.
pub(crate) async fn run_db_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = pricesync_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// # Errors
///
/// Returns an error if the database does not answer.
pub(crate) async fn run_db_ping(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    pricesync_db::health_check(pool).await?;
    println!("database ok");
    Ok(())
}
