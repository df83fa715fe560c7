use super::*;

#[test]
fn db_migrate_parses() {
    let cli = Cli::try_parse_from(["pricesync-cli", "db", "migrate"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn db_ping_parses() {
    let cli = Cli::try_parse_from(["pricesync-cli", "db", "ping"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn pipeline_bootstrap_parses() {
    let cli = Cli::try_parse_from(["pricesync-cli", "pipeline", "bootstrap"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Pipeline {
            command: PipelineCommands::Bootstrap
        })
    ));
}

#[test]
fn pipeline_refresh_parses() {
    let cli = Cli::try_parse_from(["pricesync-cli", "pipeline", "refresh"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Pipeline {
            command: PipelineCommands::Refresh
        })
    ));
}

#[test]
fn ledger_status_parses() {
    let cli = Cli::try_parse_from(["pricesync-cli", "ledger", "status"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Ledger {
            command: LedgerCommands::Status
        })
    ));
}

#[test]
fn ledger_reset_accepts_stage_in_any_case() {
    let cli = Cli::try_parse_from(["pricesync-cli", "ledger", "reset", "price_update"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Ledger {
            command: LedgerCommands::Reset {
                stage: PipelineStage::PriceUpdate
            }
        })
    ));
}

#[test]
fn ledger_reset_rejects_unknown_stage() {
    let result = Cli::try_parse_from(["pricesync-cli", "ledger", "reset", "WAREHOUSE_SYNC"]);
    assert!(result.is_err());
}

#[test]
fn ledger_reset_requires_stage() {
    let result = Cli::try_parse_from(["pricesync-cli", "ledger", "reset"]);
    assert!(result.is_err());
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["pricesync-cli"]).unwrap();
    assert!(cli.command.is_none());
}
