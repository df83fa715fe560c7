//! Rami Levi, published through the shared "publishedprices" portal.
//!
//! The portal needs a username-only login. Downloads are authorised by the
//! session cookie, so the driver captures it after discovery and hands it
//! to the retrieval service through [`SessionCredentials`].

use async_trait::async_trait;
use pricesync_core::{FileDescriptor, FileKind};
use scraper::Html;
use url::Url;

use super::html::{element_text, parse_form, resolve_href, selector, HtmlForm};
use super::{FileWindow, SessionCredentials, SourceDriver, GZ_SUFFIX_TIMESTAMP};
use crate::error::ScraperError;
use crate::session::{Page, Session, SessionCookie};

const NAME: &str = "rami_levi";

/// One row of the portal's file table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListedFile {
    pub name: String,
    pub href: String,
}

#[derive(Debug, Clone, Default)]
struct CapturedCookies(Vec<SessionCookie>);

impl SessionCredentials for CapturedCookies {
    fn cookies(&self) -> Vec<SessionCookie> {
        self.0.clone()
    }
}

pub struct RamiLeviDriver {
    login_url: String,
    files_url: String,
    username: String,
    cookies: Option<CapturedCookies>,
}

impl RamiLeviDriver {
    #[must_use]
    pub fn new(login_url: &str, files_url: &str, username: &str) -> Self {
        Self {
            login_url: login_url.to_owned(),
            files_url: files_url.to_owned(),
            username: username.to_owned(),
            cookies: None,
        }
    }
}

#[async_trait]
impl SourceDriver for RamiLeviDriver {
    fn name(&self) -> &str {
        NAME
    }

    async fn authenticate(&mut self, session: &Session) -> Result<(), ScraperError> {
        tracing::info!(source = NAME, url = %self.login_url, "opening login page");
        let login_page = session.get_page(&self.login_url).await?;
        let form = login_form(&login_page, &self.username)?;

        let landed = session.post_form(&form.action, &form.fields).await?;
        if !landed.url.path().contains("/file") {
            return Err(ScraperError::Authentication {
                source_name: NAME.to_owned(),
                reason: format!("login did not reach the file listing (landed on {})", landed.url),
            });
        }

        tracing::info!(source = NAME, "login successful");
        Ok(())
    }

    async fn discover_files(
        &mut self,
        session: &Session,
        kind: FileKind,
        max_age_hours: i64,
    ) -> Result<Vec<FileDescriptor>, ScraperError> {
        tracing::info!(source = NAME, url = %self.files_url, %kind, "listing files");
        let page = session.get_page(&self.files_url).await?;
        let listed = parse_file_list(&page.body, &page.url)?;
        self.cookies = Some(CapturedCookies(session.cookies_for(&self.files_url)));

        tracing::info!(source = NAME, rows = listed.len(), "file table read");
        let files = select_files(&listed, kind, max_age_hours);
        tracing::info!(source = NAME, %kind, selected = files.len(), "discovery complete");
        Ok(files)
    }

    fn session_credentials(&self) -> Option<&dyn SessionCredentials> {
        self.cookies
            .as_ref()
            .map(|c| c as &dyn SessionCredentials)
    }
}

fn login_form(page: &Page, username: &str) -> Result<HtmlForm, ScraperError> {
    let document = Html::parse_document(&page.body);
    let mut form = parse_form(&document, "form", &page.url)?;
    form.set("username", username);
    Ok(form)
}

/// Read `table#fileList`. Rows without a link in their first cell are
/// skipped with a warning.
///
/// # Errors
///
/// Returns [`ScraperError::PageStructure`] if the page has no file table.
pub(crate) fn parse_file_list(body: &str, page_url: &Url) -> Result<Vec<ListedFile>, ScraperError> {
    let document = Html::parse_document(body);
    let table_sel = selector("table#fileList")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a")?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| ScraperError::PageStructure {
            url: page_url.to_string(),
            reason: "missing table#fileList".to_owned(),
        })?;

    let mut files = Vec::new();
    for row in table.select(&row_sel) {
        let Some(first_cell) = row.select(&cell_sel).next() else {
            // header rows use <th>
            continue;
        };
        let Some(link) = first_cell.select(&link_sel).next() else {
            tracing::warn!(source = NAME, "skipping row without a file link");
            continue;
        };
        let Some(href) = link
            .value()
            .attr("href")
            .and_then(|h| resolve_href(page_url, h))
        else {
            tracing::warn!(source = NAME, "skipping row with unusable href");
            continue;
        };
        files.push(ListedFile {
            name: element_text(link),
            href,
        });
    }
    Ok(files)
}

fn select_files(listed: &[ListedFile], kind: FileKind, max_age_hours: i64) -> Vec<FileDescriptor> {
    let mut window = FileWindow::new(NAME, kind, max_age_hours, &GZ_SUFFIX_TIMESTAMP);
    for file in listed {
        if FileKind::from_file_name(&file.name) != kind {
            continue;
        }
        window.offer(&file.name, file.href.clone());
    }
    window.into_files()
}
