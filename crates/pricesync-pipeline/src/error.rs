use std::path::{Path, PathBuf};

use pricesync_db::DbError;
use pricesync_feeds::FeedError;
use pricesync_scraper::ScraperError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Scraper(#[from] ScraperError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("classifier failed: {0}")]
    Classifier(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl PipelineError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
