//! Image URLs (and better names) for items, from chain catalog exports.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use pricesync_core::ImageCatalogs;
use pricesync_db::{ItemImageUpdate, ItemNameRow};
use pricesync_feeds::{
    read_extra_catalog, read_rami_levi_catalog, read_shufersal_catalog, CatalogEntry, FeedError,
};
use sqlx::PgPool;

use crate::error::PipelineError;
use crate::seed::blocking;

type Catalog = HashMap<String, CatalogEntry>;
type CatalogReader = fn(&Path, &HashSet<String>) -> Result<Catalog, FeedError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageSummary {
    pub missing: usize,
    pub updated: u64,
}

/// Fill in images for items that have none.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if reading or updating items fails. Missing
/// or unreadable catalogs are logged and treated as empty.
pub async fn enrich_images(
    pool: &PgPool,
    catalogs: &ImageCatalogs,
) -> Result<ImageSummary, PipelineError> {
    let missing = pricesync_db::list_items_missing_image(pool).await?;
    if missing.is_empty() {
        return Ok(ImageSummary::default());
    }
    let wanted: HashSet<String> = missing.iter().map(|row| row.item_code.clone()).collect();

    let rami_levi = load(catalogs.rami_levi.as_deref(), &wanted, read_rami_levi_catalog).await?;
    let shufersal = load(catalogs.shufersal.as_deref(), &wanted, read_shufersal_catalog).await?;
    let extra = load(catalogs.extra.as_deref(), &wanted, read_extra_catalog).await?;

    let updates = resolve_image_updates(&missing, &rami_levi, &shufersal, &extra);
    let updated = pricesync_db::update_item_images(pool, &updates).await?;
    tracing::info!(missing = missing.len(), updated, "item images enriched");

    Ok(ImageSummary {
        missing: missing.len(),
        updated,
    })
}

async fn load(
    path: Option<&Path>,
    wanted: &HashSet<String>,
    reader: CatalogReader,
) -> Result<Catalog, PipelineError> {
    let Some(path) = path else {
        return Ok(Catalog::new());
    };
    let owned: PathBuf = path.to_path_buf();
    let wanted = wanted.clone();
    Ok(match blocking(move || reader(&owned, &wanted)).await? {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "image catalog unavailable");
            Catalog::new()
        }
    })
}

/// Pick an image for each item.
///
/// Rami Levi wins over Shufersal, and both may also supply a name. The
/// image-only catalog is the fallback. Items with no usable image are left
/// out.
#[must_use]
pub fn resolve_image_updates(
    items: &[ItemNameRow],
    rami_levi: &Catalog,
    shufersal: &Catalog,
    extra: &Catalog,
) -> Vec<ItemImageUpdate> {
    items
        .iter()
        .filter_map(|item| {
            let code = &item.item_code;
            let primary = rami_levi
                .get(code)
                .or_else(|| shufersal.get(code))
                .filter(|entry| !entry.image_url.is_empty());
            let fallback = || extra.get(code).filter(|entry| !entry.image_url.is_empty());

            primary
                .map(|entry| ItemImageUpdate {
                    item_code: code.clone(),
                    name: entry.name.clone(),
                    image_url: entry.image_url.clone(),
                })
                .or_else(|| {
                    fallback().map(|entry| ItemImageUpdate {
                        item_code: code.clone(),
                        name: None,
                        image_url: entry.image_url.clone(),
                    })
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(code: &str) -> ItemNameRow {
        ItemNameRow {
            item_code: code.to_owned(),
            name: None,
        }
    }

    fn entry(name: Option<&str>, image: &str) -> CatalogEntry {
        CatalogEntry {
            name: name.map(str::to_owned),
            image_url: image.to_owned(),
        }
    }

    fn catalog(entries: &[(&str, CatalogEntry)]) -> Catalog {
        entries
            .iter()
            .map(|(code, e)| ((*code).to_owned(), e.clone()))
            .collect()
    }

    #[test]
    fn rami_levi_then_shufersal_then_extra() {
        let items = [item("1"), item("2"), item("3"), item("4")];
        let rami = catalog(&[("1", entry(Some("רמי"), "https://rl/1.jpg"))]);
        let shuf = catalog(&[
            ("1", entry(Some("שופרסל"), "https://sh/1.jpg")),
            ("2", entry(None, "https://sh/2.jpg")),
        ]);
        let extra = catalog(&[
            ("2", entry(None, "https://x/2.jpg")),
            ("3", entry(None, "https://x/3.jpg")),
        ]);

        let updates = resolve_image_updates(&items, &rami, &shuf, &extra);
        assert_eq!(
            updates,
            vec![
                ItemImageUpdate {
                    item_code: "1".to_owned(),
                    name: Some("רמי".to_owned()),
                    image_url: "https://rl/1.jpg".to_owned(),
                },
                ItemImageUpdate {
                    item_code: "2".to_owned(),
                    name: None,
                    image_url: "https://sh/2.jpg".to_owned(),
                },
                ItemImageUpdate {
                    item_code: "3".to_owned(),
                    name: None,
                    image_url: "https://x/3.jpg".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn blank_primary_image_falls_back_to_extra() {
        let items = [item("9")];
        let shuf = catalog(&[("9", entry(Some("שם"), ""))]);
        let extra = catalog(&[("9", entry(None, "https://x/9.jpg"))]);

        let updates = resolve_image_updates(&items, &Catalog::new(), &shuf, &extra);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].image_url, "https://x/9.jpg");
        assert_eq!(updates[0].name, None);
    }
}
