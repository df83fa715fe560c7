use std::path::PathBuf;

use crate::app_config::{AppConfig, ClassifierConfig, Environment, ImageCatalogs, SourceConfig};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
#[allow(clippy::too_many_lines)]
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Unset and empty are treated the same for optional paths.
    let optional_path = |var: &str| -> Option<PathBuf> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("PRICESYNC_ENV", "development"));
    let bind_addr = parse_addr("PRICESYNC_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("PRICESYNC_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("PRICESYNC_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("PRICESYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("PRICESYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let http_timeout_secs = parse_u64("PRICESYNC_HTTP_TIMEOUT_SECS", "60")?;
    let http_user_agent = or_default("PRICESYNC_HTTP_USER_AGENT", DEFAULT_USER_AGENT);
    let http_max_retries = parse_u32("PRICESYNC_HTTP_MAX_RETRIES", "3")?;
    let http_retry_backoff_base_secs = parse_u64("PRICESYNC_HTTP_RETRY_BACKOFF_BASE_SECS", "5")?;

    let chain_file = PathBuf::from(or_default(
        "PRICESYNC_CHAIN_FILE",
        "./data/chains/chains.xml",
    ));
    let stores_dir = PathBuf::from(or_default("PRICESYNC_STORES_DIR", "./data/stores"));
    let pricefull_dir = PathBuf::from(or_default("PRICESYNC_PRICEFULL_DIR", "./data/pricefull"));
    let prices_dir = PathBuf::from(or_default("PRICESYNC_PRICES_DIR", "./data/prices"));

    let lookback_hours = or_default("PRICESYNC_LOOKBACK_HOURS", "24")
        .parse::<i64>()
        .map_err(|e| invalid("PRICESYNC_LOOKBACK_HOURS", e.to_string()))?;
    if lookback_hours < 0 {
        return Err(invalid(
            "PRICESYNC_LOOKBACK_HOURS",
            "must not be negative".to_string(),
        ));
    }

    let batch_size = parse_positive_usize("PRICESYNC_BATCH_SIZE", "300")?;
    let flush_threshold = parse_positive_usize("PRICESYNC_FLUSH_THRESHOLD", "1000")?;
    let refresh_cron = or_default("PRICESYNC_REFRESH_CRON", "0 0 2 * * *");

    let sources = SourceConfig {
        rami_levi_login_url: or_default(
            "PRICESYNC_RAMI_LEVI_LOGIN_URL",
            "https://url.retail.publishedprices.co.il/login",
        ),
        rami_levi_files_url: or_default(
            "PRICESYNC_RAMI_LEVI_FILES_URL",
            "https://url.retail.publishedprices.co.il/file",
        ),
        rami_levi_username: or_default("PRICESYNC_RAMI_LEVI_USERNAME", "RamiLevi"),
        shufersal_base_url: or_default(
            "PRICESYNC_SHUFERSAL_BASE_URL",
            "https://prices.shufersal.co.il/",
        ),
        victory_base_url: or_default("PRICESYNC_VICTORY_BASE_URL", "https://laibcatalog.co.il/"),
    };

    let classifier = match optional_path("PRICESYNC_CLASSIFIER_SCRIPT") {
        None => None,
        Some(script) => {
            let model = optional_path("PRICESYNC_CLASSIFIER_MODEL")
                .ok_or_else(|| ConfigError::MissingEnvVar("PRICESYNC_CLASSIFIER_MODEL".into()))?;
            Some(ClassifierConfig {
                python: or_default("PRICESYNC_CLASSIFIER_PYTHON", "python"),
                script,
                model,
                input_csv: optional_path("PRICESYNC_CLASSIFIER_INPUT_CSV")
                    .unwrap_or_else(|| PathBuf::from("./data/classify/items_in.csv")),
                output_csv: optional_path("PRICESYNC_CLASSIFIER_OUTPUT_CSV")
                    .unwrap_or_else(|| PathBuf::from("./data/classify/items_out.csv")),
            })
        }
    };

    let image_catalogs = ImageCatalogs {
        rami_levi: optional_path("PRICESYNC_IMAGE_CATALOG_RAMI_LEVI"),
        shufersal: optional_path("PRICESYNC_IMAGE_CATALOG_SHUFERSAL"),
        extra: optional_path("PRICESYNC_IMAGE_CATALOG_EXTRA"),
    };

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        http_timeout_secs,
        http_user_agent,
        http_max_retries,
        http_retry_backoff_base_secs,
        chain_file,
        stores_dir,
        pricefull_dir,
        prices_dir,
        lookback_hours,
        batch_size,
        flush_threshold,
        refresh_cron,
        sources,
        classifier,
        category_fix_csv: optional_path("PRICESYNC_CATEGORY_FIX_CSV"),
        image_catalogs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
