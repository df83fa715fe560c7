//! Streaming download of feed files to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pricesync_core::AppConfig;
use reqwest::header::{COOKIE, USER_AGENT};
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;
use crate::session::{check_status, parse_url, SessionCookie};

/// Some portals reject anything that does not look like a browser.
const DOWNLOAD_USER_AGENT: &str = "Mozilla/5.0";

/// Downloads files with an optional replayed `Cookie` header.
///
/// Bodies are streamed to `<destination>.part` and renamed into place once
/// complete, so a destination path never holds a partial file.
#[derive(Debug, Clone)]
pub struct RetrievalService {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl RetrievalService {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the client cannot be built.
    pub fn new(
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.http_timeout_secs,
            config.http_max_retries,
            config.http_retry_backoff_base_secs,
        )
    }

    /// Download `url` to `destination`, returning the number of bytes written.
    ///
    /// An existing file at `destination` is replaced.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`] if `url` does not parse.
    /// - [`ScraperError::NotFound`] / [`ScraperError::UnexpectedStatus`] for
    ///   non-2xx responses.
    /// - [`ScraperError::Io`] if the file cannot be written or renamed.
    /// - [`ScraperError::Http`] for network failures after all retries.
    pub async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        cookies: Option<&[SessionCookie]>,
    ) -> Result<u64, ScraperError> {
        let target = parse_url(url)?;
        let cookie_header = cookies.map(cookie_header).filter(|h| !h.is_empty());
        let partial = partial_path(destination);

        let written = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let target = target.clone();
            let cookie_header = cookie_header.clone();
            let partial = partial.clone();
            async move {
                remove_stale(&partial).await?;

                let mut request = self
                    .client
                    .get(target.clone())
                    .header(USER_AGENT, DOWNLOAD_USER_AGENT);
                if let Some(header) = cookie_header {
                    request = request.header(COOKIE, header);
                }
                let mut response = check_status(request.send().await?, &target)?;

                let mut file = tokio::fs::File::create(&partial)
                    .await
                    .map_err(|e| ScraperError::io(&partial, e))?;
                let mut written = 0u64;
                while let Some(chunk) = response.chunk().await? {
                    file.write_all(&chunk)
                        .await
                        .map_err(|e| ScraperError::io(&partial, e))?;
                    written += chunk.len() as u64;
                }
                file.flush()
                    .await
                    .map_err(|e| ScraperError::io(&partial, e))?;
                Ok(written)
            }
        })
        .await;

        let written = match written {
            Ok(n) => n,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };

        tokio::fs::rename(&partial, destination)
            .await
            .map_err(|e| ScraperError::io(destination, e))?;
        tracing::debug!(url, path = %destination.display(), bytes = written, "download complete");
        Ok(written)
    }
}

/// `name=value; ` for each cookie, concatenated.
fn cookie_header(cookies: &[SessionCookie]) -> String {
    cookies
        .iter()
        .map(|c| format!("{}={}; ", c.name, c.value))
        .collect()
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn remove_stale(partial: &Path) -> Result<(), ScraperError> {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ScraperError::io(partial, e)),
    }
}
