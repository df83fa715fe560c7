//! Download and decompress one file kind from every source.

use std::path::{Path, PathBuf};

use pricesync_core::{AppConfig, FileKind};
use pricesync_scraper::{
    convert_directory, ConversionSummary, RetrievalService, Session, SourceDriver,
};

use crate::error::PipelineError;

/// Per-driver result of a fetch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverFetch {
    pub driver: String,
    pub discovered: usize,
    pub downloaded: usize,
    pub download_failures: usize,
    pub converted: ConversionSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub drivers: Vec<DriverFetch>,
    /// Drivers whose authentication or discovery failed.
    pub failed_drivers: Vec<String>,
}

impl FetchSummary {
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.drivers.iter().map(|d| d.downloaded).sum()
    }
}

/// HTTP clients for one fetch run.
pub struct Fetcher {
    session: Session,
    retrieval: RetrievalService,
}

impl Fetcher {
    #[must_use]
    pub fn new(session: Session, retrieval: RetrievalService) -> Self {
        Self { session, retrieval }
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::Scraper`] if either HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        Ok(Self::new(
            Session::from_config(config)?,
            RetrievalService::from_config(config)?,
        ))
    }
}

/// Run every driver for `kind` and leave the converted XML under
/// `<base>/<driver name>`.
///
/// Drivers run in order on one session. A driver that fails to authenticate
/// or discover is recorded in [`FetchSummary::failed_drivers`] and the run
/// moves on; a file that fails to download is logged and skipped.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if a download directory cannot be created,
/// or [`PipelineError::Join`] if decompression panics.
pub async fn download_and_convert(
    fetcher: &Fetcher,
    drivers: &mut [Box<dyn SourceDriver>],
    kind: FileKind,
    max_age_hours: i64,
    base: &Path,
) -> Result<FetchSummary, PipelineError> {
    let mut summary = FetchSummary::default();

    for driver in drivers.iter_mut() {
        let name = driver.name().to_owned();
        let dir = base.join(&name);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PipelineError::io(&dir, e))?;

        if let Err(e) = driver.authenticate(&fetcher.session).await {
            tracing::error!(driver = %name, error = %e, "authentication failed, skipping source");
            summary.failed_drivers.push(name);
            continue;
        }

        let files = match driver
            .discover_files(&fetcher.session, kind, max_age_hours)
            .await
        {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(driver = %name, %kind, error = %e, "file discovery failed, skipping source");
                summary.failed_drivers.push(name);
                continue;
            }
        };
        tracing::info!(driver = %name, %kind, files = files.len(), "discovered files");

        let cookies = driver.session_credentials().map(|c| c.cookies());
        let mut downloaded = 0;
        let mut download_failures = 0;
        for file in &files {
            let destination = dir.join(&file.file_name);
            match fetcher
                .retrieval
                .fetch(&file.download_url, &destination, cookies.as_deref())
                .await
            {
                Ok(bytes) => {
                    tracing::debug!(driver = %name, file = %file.file_name, bytes, "downloaded");
                    downloaded += 1;
                }
                Err(e) => {
                    tracing::warn!(driver = %name, file = %file.file_name, error = %e, "download failed");
                    download_failures += 1;
                }
            }
        }

        let converted = convert_in_background(dir).await?;
        summary.drivers.push(DriverFetch {
            driver: name,
            discovered: files.len(),
            downloaded,
            download_failures,
            converted,
        });
    }

    if !summary.failed_drivers.is_empty() {
        tracing::warn!(
            failed = ?summary.failed_drivers,
            "some sources could not be fetched"
        );
    }
    Ok(summary)
}

async fn convert_in_background(dir: PathBuf) -> Result<ConversionSummary, PipelineError> {
    Ok(tokio::task::spawn_blocking(move || convert_directory(&dir)).await?)
}
