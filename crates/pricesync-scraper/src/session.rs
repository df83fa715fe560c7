//! Shared HTTP session used by every source driver in a run.

use std::sync::Arc;
use std::time::Duration;

use pricesync_core::AppConfig;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

/// A cookie captured from the session jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
}

/// An HTML page as loaded by the session, after redirects.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects.
    pub url: Url,
    pub body: String,
}

/// One `reqwest::Client` plus its cookie jar.
///
/// Cookies set by a portal during login persist for every later request
/// through the same session.
pub struct Session {
    client: Client,
    jar: Arc<Jar>,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl Session {
    /// Builds a session with the given timeout, `User-Agent`, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying client cannot be built.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .cookie_provider(Arc::clone(&jar))
            .build()?;
        Ok(Self {
            client,
            jar,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Builds a session from the HTTP settings in [`AppConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.http_timeout_secs,
            &config.http_user_agent,
            config.http_max_retries,
            config.http_retry_backoff_base_secs,
        )
    }

    /// GET `url` and return the page body, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`] if `url` does not parse.
    /// - [`ScraperError::NotFound`], [`ScraperError::RateLimited`], or
    ///   [`ScraperError::UnexpectedStatus`] for non-2xx responses.
    /// - [`ScraperError::Http`] for network failures after all retries.
    pub async fn get_page(&self, url: &str) -> Result<Page, ScraperError> {
        let target = parse_url(url)?;
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let target = target.clone();
            async move {
                let response = self.client.get(target.clone()).send().await?;
                read_page(check_status(response, &target)?).await
            }
        })
        .await
    }

    /// POST `fields` as `application/x-www-form-urlencoded` to `url`.
    ///
    /// # Errors
    ///
    /// Same as [`Session::get_page`].
    pub async fn post_form(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<Page, ScraperError> {
        let target = parse_url(url)?;
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let target = target.clone();
            async move {
                let response = self
                    .client
                    .post(target.clone())
                    .form(fields)
                    .send()
                    .await?;
                read_page(check_status(response, &target)?).await
            }
        })
        .await
    }

    /// Cookies the jar would send to `url`. Empty for unparseable URLs.
    #[must_use]
    pub fn cookies_for(&self, url: &str) -> Vec<SessionCookie> {
        let Ok(target) = Url::parse(url) else {
            return Vec::new();
        };
        self.jar
            .cookies(&target)
            .and_then(|header| header.to_str().ok().map(parse_cookie_header))
            .unwrap_or_default()
    }
}

async fn read_page(response: Response) -> Result<Page, ScraperError> {
    let url = response.url().clone();
    let body = response.text().await?;
    Ok(Page { url, body })
}

pub(crate) fn parse_url(url: &str) -> Result<Url, ScraperError> {
    Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })
}

/// Map non-success statuses to typed errors; pass 2xx responses through.
pub(crate) fn check_status(response: Response, url: &Url) -> Result<Response, ScraperError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);
        return Err(ScraperError::RateLimited {
            domain: url.host_str().unwrap_or_default().to_owned(),
            retry_after_secs,
        });
    }

    if status == StatusCode::NOT_FOUND {
        return Err(ScraperError::NotFound {
            url: url.to_string(),
        });
    }

    Err(ScraperError::UnexpectedStatus {
        status: status.as_u16(),
        url: url.to_string(),
    })
}

/// Split a `Cookie` header value (`a=1; b=2`) into name/value pairs.
fn parse_cookie_header(header: &str) -> Vec<SessionCookie> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(SessionCookie {
                name: name.to_owned(),
                value: value.trim().to_owned(),
            })
        })
        .collect()
}
