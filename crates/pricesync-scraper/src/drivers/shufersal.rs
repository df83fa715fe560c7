//! Shufersal's public file grid.
//!
//! No login: the grid is public and paginated with a `>` link. Download links
//! point at signed blob URLs, so the file name comes from the href path.

use async_trait::async_trait;
use pricesync_core::{FileDescriptor, FileKind};
use scraper::Html;
use url::Url;

use super::html::{element_text, last_path_segment, resolve_href, selector};
use super::{FileWindow, SourceDriver, GZ_SUFFIX_TIMESTAMP};
use crate::error::ScraperError;
use crate::session::Session;

const NAME: &str = "shufersal";

/// Hard stop for the `>` chain, in case the pager links loop.
const MAX_PAGES: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GridRow {
    pub name: String,
    pub href: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GridPage {
    pub rows: Vec<GridRow>,
    pub next: Option<String>,
}

pub struct ShufersalDriver {
    base_url: String,
}

impl ShufersalDriver {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
        }
    }
}

#[async_trait]
impl SourceDriver for ShufersalDriver {
    fn name(&self) -> &str {
        NAME
    }

    async fn authenticate(&mut self, session: &Session) -> Result<(), ScraperError> {
        let page = session.get_page(&self.base_url).await?;
        parse_grid(&page.body, &page.url)?;
        tracing::info!(source = NAME, "file grid reachable");
        Ok(())
    }

    async fn discover_files(
        &mut self,
        session: &Session,
        kind: FileKind,
        max_age_hours: i64,
    ) -> Result<Vec<FileDescriptor>, ScraperError> {
        let mut window = FileWindow::new(NAME, kind, max_age_hours, &GZ_SUFFIX_TIMESTAMP);
        let mut url = self.base_url.clone();
        let mut page_number = 1usize;

        loop {
            if page_number > MAX_PAGES {
                return Err(ScraperError::PaginationLimit {
                    url: self.base_url.clone(),
                    max_pages: MAX_PAGES,
                });
            }

            let grid = match fetch_grid(session, &url).await {
                Ok(grid) => grid,
                Err(e) if page_number == 1 => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        source = NAME,
                        page = page_number,
                        error = %e,
                        "stopping pagination"
                    );
                    break;
                }
            };
            tracing::debug!(source = NAME, page = page_number, rows = grid.rows.len(), "grid page read");

            for row in &grid.rows {
                if row.format.eq_ignore_ascii_case("GZ") && matches_kind(&row.name, kind) {
                    window.offer(&row.name, row.href.clone());
                }
            }

            match grid.next {
                Some(next) => {
                    url = next;
                    page_number += 1;
                }
                None => break,
            }
        }

        let files = window.into_files();
        tracing::info!(source = NAME, %kind, pages = page_number, selected = files.len(), "discovery complete");
        Ok(files)
    }
}

async fn fetch_grid(session: &Session, url: &str) -> Result<GridPage, ScraperError> {
    let page = session.get_page(url).await?;
    parse_grid(&page.body, &page.url)
}

/// Case-insensitive kind test on a grid file name.
pub(crate) fn matches_kind(file_name: &str, kind: FileKind) -> bool {
    let name = file_name.to_lowercase();
    match kind {
        FileKind::Price => name.starts_with("price") && !name.starts_with("pricefull"),
        FileKind::PriceFull => name.contains("pricefull"),
        FileKind::Promo => name.starts_with("promo") && !name.starts_with("promofull"),
        FileKind::PromoFull => name.contains("promofull"),
        FileKind::Store => name.starts_with("store"),
        FileKind::Unknown => false,
    }
}

/// Read one page of `table.webgrid`, skipping its header row.
///
/// # Errors
///
/// Returns [`ScraperError::PageStructure`] if the grid is absent.
pub(crate) fn parse_grid(body: &str, page_url: &Url) -> Result<GridPage, ScraperError> {
    let document = Html::parse_document(body);
    let table_sel = selector("table.webgrid")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a")?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| ScraperError::PageStructure {
            url: page_url.to_string(),
            reason: "missing table.webgrid".to_owned(),
        })?;

    let mut rows = Vec::new();
    for row in table.select(&row_sel).skip(1) {
        let cells: Vec<_> = row.select(&cell_sel).collect();
        let Some(href) = cells
            .first()
            .and_then(|c| c.select(&link_sel).next())
            .and_then(|a| a.value().attr("href"))
            .and_then(|h| resolve_href(page_url, h))
        else {
            tracing::warn!(source = NAME, "skipping grid row without a download link");
            continue;
        };
        let format = cells.get(3).map(|c| element_text(*c)).unwrap_or_default();
        rows.push(GridRow {
            name: last_path_segment(&href).to_owned(),
            href,
            format,
        });
    }

    let next = document
        .select(&link_sel)
        .find(|a| element_text(*a) == ">")
        .and_then(|a| a.value().attr("href"))
        .and_then(|h| resolve_href(page_url, h));

    Ok(GridPage { rows, next })
}
