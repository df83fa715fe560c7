//! Victory, listed on a shared ASP.NET catalog that lists several chains.
//!
//! Files are found by date search (a WebForms postback), so the driver
//! searches today and yesterday and keeps only Victory's chain id.

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use pricesync_core::{FileDescriptor, FileKind};
use scraper::Html;
use url::Url;

use super::html::{last_path_segment, parse_form, resolve_href, selector, HtmlForm};
use super::{FileWindow, SourceDriver, DASHED_TIMESTAMP};
use crate::error::ScraperError;
use crate::session::{Page, Session};

const NAME: &str = "victory";

/// Victory's GS1 chain id; the catalog also lists other chains.
const CHAIN_ID: &str = "7290696200003";

const DATE_INPUT_ID: &str = "MainContent_txtDate";
const SEARCH_BUTTON_ID: &str = "MainContent_btnSearch";
const SEARCH_DATE_FORMAT: &str = "%d/%m/%Y";

/// Days searched, counted back from today.
const SEARCH_DAYS: u64 = 2;

pub struct VictoryDriver {
    base_url: String,
}

impl VictoryDriver {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
        }
    }
}

#[async_trait]
impl SourceDriver for VictoryDriver {
    fn name(&self) -> &str {
        NAME
    }

    async fn authenticate(&mut self, session: &Session) -> Result<(), ScraperError> {
        let page = session.get_page(&self.base_url).await?;
        if !has_links(&page.body)? {
            return Err(ScraperError::Authentication {
                source_name: NAME.to_owned(),
                reason: "catalog page has no links".to_owned(),
            });
        }
        tracing::info!(source = NAME, "catalog page loaded");
        Ok(())
    }

    async fn discover_files(
        &mut self,
        session: &Session,
        kind: FileKind,
        max_age_hours: i64,
    ) -> Result<Vec<FileDescriptor>, ScraperError> {
        let mut window = FileWindow::new(NAME, kind, max_age_hours, &DASHED_TIMESTAMP);
        let today = Local::now().date_naive();

        for offset in 0..SEARCH_DAYS {
            let Some(date) = today.checked_sub_days(Days::new(offset)) else {
                continue;
            };
            let results = search_date(session, &self.base_url, date).await?;
            let links = parse_gz_links(&results.body, &results.url)?;
            tracing::debug!(source = NAME, %date, links = links.len(), "date search returned");

            for href in links {
                let name = last_path_segment(&href).to_owned();
                if !name.contains(CHAIN_ID) || FileKind::from_file_name(&name) != kind {
                    continue;
                }
                window.offer(&name, href);
            }
        }

        let files = window.into_files();
        tracing::info!(source = NAME, %kind, selected = files.len(), "discovery complete");
        Ok(files)
    }
}

async fn search_date(
    session: &Session,
    base_url: &str,
    date: NaiveDate,
) -> Result<Page, ScraperError> {
    let page = session.get_page(base_url).await?;
    let form = search_form(&page, date)?;
    tracing::info!(source = NAME, date = %date.format(SEARCH_DATE_FORMAT), "searching files");
    session.post_form(&form.action, &form.fields).await
}

fn has_links(body: &str) -> Result<bool, ScraperError> {
    let document = Html::parse_document(body);
    let link_sel = selector("a")?;
    Ok(document.select(&link_sel).next().is_some())
}

/// Build the date-search postback from the catalog page.
///
/// Hidden WebForms state (`__VIEWSTATE` and friends) is kept as served.
///
/// # Errors
///
/// Returns [`ScraperError::PageStructure`] when the page lacks the form, the
/// date input, or the search button.
pub(crate) fn search_form(page: &Page, date: NaiveDate) -> Result<HtmlForm, ScraperError> {
    let document = Html::parse_document(&page.body);
    let mut form = parse_form(&document, "form", &page.url)?;

    let date_name = named_input(&document, DATE_INPUT_ID, &page.url)?;
    form.set(&date_name, &date.format(SEARCH_DATE_FORMAT).to_string());

    let button_name = named_input(&document, SEARCH_BUTTON_ID, &page.url)?;
    let button_sel = selector(&format!("#{SEARCH_BUTTON_ID}"))?;
    let button_value = document
        .select(&button_sel)
        .next()
        .and_then(|b| b.value().attr("value"))
        .unwrap_or_default()
        .to_owned();
    form.set(&button_name, &button_value);

    Ok(form)
}

fn named_input(document: &Html, id: &str, page_url: &Url) -> Result<String, ScraperError> {
    let input_sel = selector(&format!("#{id}"))?;
    document
        .select(&input_sel)
        .next()
        .and_then(|input| input.value().attr("name"))
        .map(str::to_owned)
        .ok_or_else(|| ScraperError::PageStructure {
            url: page_url.to_string(),
            reason: format!("missing named element #{id}"),
        })
}

/// Resolved hrefs of every `a[href$='.gz']` on the page, in page order.
pub(crate) fn parse_gz_links(body: &str, page_url: &Url) -> Result<Vec<String>, ScraperError> {
    let document = Html::parse_document(body);
    let link_sel = selector("a[href$='.gz']")?;
    Ok(document
        .select(&link_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|h| resolve_href(page_url, h))
        .collect())
}
