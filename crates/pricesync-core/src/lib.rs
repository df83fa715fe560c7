mod app_config;
mod config;
pub mod feeds;
pub mod records;
pub mod stages;

pub use app_config::{AppConfig, ClassifierConfig, Environment, ImageCatalogs, SourceConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use feeds::{FileDescriptor, FileKind};
pub use records::{ChainRecord, ItemRecord, PriceRecord, StoreIdentifier, StoreRecord};
pub use stages::{PipelineStage, StageStatus};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown pipeline stage: {0}")]
    UnknownStage(String),
}
