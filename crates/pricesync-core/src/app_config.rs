use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Entry points of the chain sites the source drivers navigate.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub rami_levi_login_url: String,
    pub rami_levi_files_url: String,
    pub rami_levi_username: String,
    pub shufersal_base_url: String,
    pub victory_base_url: String,
}

/// External category classifier invocation.
///
/// The process is run as `<python> <script> <input_csv> <output_csv> <model>`.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub python: String,
    pub script: PathBuf,
    pub model: PathBuf,
    pub input_csv: PathBuf,
    pub output_csv: PathBuf,
}

/// Local CSV catalogs used to fill in item names and image URLs.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalogs {
    pub rami_levi: Option<PathBuf>,
    pub shufersal: Option<PathBuf>,
    pub extra: Option<PathBuf>,
}

impl ImageCatalogs {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rami_levi.is_none() && self.shufersal.is_none() && self.extra.is_none()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub http_user_agent: String,
    pub http_max_retries: u32,
    pub http_retry_backoff_base_secs: u64,
    pub chain_file: PathBuf,
    pub stores_dir: PathBuf,
    pub pricefull_dir: PathBuf,
    pub prices_dir: PathBuf,
    pub lookback_hours: i64,
    pub batch_size: usize,
    pub flush_threshold: usize,
    pub refresh_cron: String,
    pub sources: SourceConfig,
    pub classifier: Option<ClassifierConfig>,
    pub category_fix_csv: Option<PathBuf>,
    pub image_catalogs: ImageCatalogs,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("http_user_agent", &self.http_user_agent)
            .field("http_max_retries", &self.http_max_retries)
            .field(
                "http_retry_backoff_base_secs",
                &self.http_retry_backoff_base_secs,
            )
            .field("chain_file", &self.chain_file)
            .field("stores_dir", &self.stores_dir)
            .field("pricefull_dir", &self.pricefull_dir)
            .field("prices_dir", &self.prices_dir)
            .field("lookback_hours", &self.lookback_hours)
            .field("batch_size", &self.batch_size)
            .field("flush_threshold", &self.flush_threshold)
            .field("refresh_cron", &self.refresh_cron)
            .field("rami_levi_login_url", &self.sources.rami_levi_login_url)
            .field("rami_levi_files_url", &self.sources.rami_levi_files_url)
            .field("rami_levi_username", &"[redacted]")
            .field("shufersal_base_url", &self.sources.shufersal_base_url)
            .field("victory_base_url", &self.sources.victory_base_url)
            .field("classifier", &self.classifier)
            .field("category_fix_csv", &self.category_fix_csv)
            .field("image_catalogs", &self.image_catalogs)
            .finish()
    }
}
