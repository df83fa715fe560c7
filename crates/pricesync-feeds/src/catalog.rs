//! CSV files exchanged with image catalogs and the category classifier.
//!
//! Every reader skips the header row, trims fields, and skips short or
//! undecodable rows with a `warn!`.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};

use crate::error::FeedError;

const RAMI_LEVI_IMAGE_BASE: &str = "https://img.rami-levy.co.il/product";

/// One catalog hit for an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: Option<String>,
    pub image_url: String,
}

/// One classifier output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub item_code: String,
    pub general_category: String,
    pub sub_category: String,
    pub specific_category: String,
}

fn records(path: &Path) -> Result<impl Iterator<Item = StringRecord>, FeedError> {
    let file = File::open(path).map_err(|e| FeedError::io(path, e))?;
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file);
    let file_name = path.display().to_string();
    Ok(reader.into_records().filter_map(move |row| match row {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(file = %file_name, error = %e, "skipping unreadable CSV row");
            None
        }
    }))
}

fn non_blank(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

fn read_catalog<F>(
    path: &Path,
    min_columns: usize,
    wanted: &HashSet<String>,
    entry: F,
) -> Result<HashMap<String, CatalogEntry>, FeedError>
where
    F: Fn(&str, &StringRecord) -> CatalogEntry,
{
    let mut catalog = HashMap::new();
    for record in records(path)? {
        if record.len() < min_columns {
            continue;
        }
        let id = &record[0];
        if wanted.contains(id) {
            catalog.insert(id.to_owned(), entry(id, &record));
        }
    }
    Ok(catalog)
}

/// Rami Levi catalog `(id, name)`. The image URL is derived from the id.
///
/// # Errors
///
/// [`FeedError::Io`] if the file cannot be opened.
pub fn read_rami_levi_catalog(
    path: &Path,
    wanted: &HashSet<String>,
) -> Result<HashMap<String, CatalogEntry>, FeedError> {
    read_catalog(path, 2, wanted, |id, record| CatalogEntry {
        name: non_blank(&record[1]),
        image_url: format!("{RAMI_LEVI_IMAGE_BASE}/{id}/small.jpg"),
    })
}

/// Shufersal catalog `(id, image_url, name)`.
///
/// # Errors
///
/// [`FeedError::Io`] if the file cannot be opened.
pub fn read_shufersal_catalog(
    path: &Path,
    wanted: &HashSet<String>,
) -> Result<HashMap<String, CatalogEntry>, FeedError> {
    read_catalog(path, 3, wanted, |_, record| CatalogEntry {
        name: non_blank(&record[2]),
        image_url: record[1].to_owned(),
    })
}

/// Image-only catalog `(id, image_url)`.
///
/// # Errors
///
/// [`FeedError::Io`] if the file cannot be opened.
pub fn read_extra_catalog(
    path: &Path,
    wanted: &HashSet<String>,
) -> Result<HashMap<String, CatalogEntry>, FeedError> {
    read_catalog(path, 2, wanted, |_, record| CatalogEntry {
        name: None,
        image_url: record[1].to_owned(),
    })
}

/// Write the classifier input file, header `item_id,item_name`.
///
/// # Errors
///
/// [`FeedError::Io`] if the file cannot be created, [`FeedError::Csv`] on a
/// write failure.
pub fn write_classifier_input<'a, I>(path: &Path, rows: I) -> Result<usize, FeedError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let file = File::create(path).map_err(|e| FeedError::io(path, e))?;
    let mut writer = WriterBuilder::new().from_writer(file);
    writer.write_record(["item_id", "item_name"])?;

    let mut written = 0;
    for (item_code, name) in rows {
        writer.write_record([item_code, name])?;
        written += 1;
    }
    writer.flush().map_err(|e| FeedError::io(path, e))?;
    Ok(written)
}

/// Read classifier output `(item_id, general, sub, specific)`.
///
/// # Errors
///
/// [`FeedError::Io`] if the file cannot be opened.
pub fn read_category_rows(path: &Path) -> Result<Vec<CategoryRow>, FeedError> {
    Ok(records(path)?
        .filter(|record| record.len() >= 4)
        .map(|record| CategoryRow {
            item_code: record[0].to_owned(),
            general_category: record[1].to_owned(),
            sub_category: record[2].to_owned(),
            specific_category: record[3].to_owned(),
        })
        .collect())
}
