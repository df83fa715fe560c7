//! Category assignment through the external classifier script.
//!
//! The classifier is a separate process reading and writing CSV. Any
//! failure on its side (spawn error, non-zero exit, missing or malformed
//! output) means "no classifications" and never fails the pipeline.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pricesync_core::ClassifierConfig;
use pricesync_db::ItemCategoryUpdate;
use pricesync_feeds::{read_category_rows, write_classifier_input, CategoryRow};
use sqlx::PgPool;
use tokio::process::Command;

use crate::error::PipelineError;
use crate::seed::blocking;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifySummary {
    pub exported: usize,
    pub classified: u64,
    pub corrected: u64,
}

fn into_updates(rows: Vec<CategoryRow>) -> Vec<ItemCategoryUpdate> {
    rows.into_iter()
        .map(|row| ItemCategoryUpdate {
            item_code: row.item_code,
            general_category: row.general_category,
            sub_category: row.sub_category,
            specific_category: row.specific_category,
        })
        .collect()
}

/// Classify every named item, then apply the correction file if given.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if reading items or writing categories
/// fails. Classifier-side failures are logged, not returned.
pub async fn categorize_items(
    pool: &PgPool,
    classifier: &ClassifierConfig,
    corrections: Option<&Path>,
) -> Result<ClassifySummary, PipelineError> {
    let mut summary = ClassifySummary::default();

    let named: Vec<(String, String)> = pricesync_db::list_item_names(pool)
        .await?
        .into_iter()
        .filter_map(|row| row.name.map(|name| (row.item_code, name)))
        .collect();

    let input = classifier.input_csv.clone();
    let export = blocking(move || {
        write_classifier_input(&input, named.iter().map(|(c, n)| (c.as_str(), n.as_str())))
    })
    .await?;

    match export {
        Ok(exported) => {
            summary.exported = exported;
            let rows = match run_classifier(classifier).await {
                Ok(()) => read_rows(&classifier.output_csv).await?,
                Err(e) => {
                    tracing::error!(error = %e, "classifier produced no output");
                    Vec::new()
                }
            };
            summary.classified = pricesync_db::apply_item_categories(pool, &into_updates(rows)).await?;
        }
        Err(e) => tracing::error!(error = %e, "could not export classifier input"),
    }

    if let Some(path) = corrections {
        let rows = read_rows(path).await?;
        summary.corrected = pricesync_db::apply_item_categories(pool, &into_updates(rows)).await?;
    }

    remove_if_present(&classifier.input_csv).await;
    remove_if_present(&classifier.output_csv).await;

    tracing::info!(
        exported = summary.exported,
        classified = summary.classified,
        corrected = summary.corrected,
        "item categorization finished"
    );
    Ok(summary)
}

/// Run `<python> <script> <input> <output> <model>` to completion.
async fn run_classifier(config: &ClassifierConfig) -> Result<(), PipelineError> {
    let output = Command::new(&config.python)
        .arg(&config.script)
        .arg(&config.input_csv)
        .arg(&config.output_csv)
        .arg(&config.model)
        .output()
        .await
        .map_err(|e| PipelineError::Classifier(format!("failed to start {}: {e}", config.python)))?;

    if output.status.success() {
        return Ok(());
    }

    for line in String::from_utf8_lossy(&output.stderr).lines() {
        tracing::error!(line, "classifier stderr");
    }
    Err(PipelineError::Classifier(format!(
        "{} exited with {}",
        config.script.display(),
        output.status
    )))
}

/// Category rows from `path`, or none when the file is missing or unreadable.
async fn read_rows(path: &Path) -> Result<Vec<CategoryRow>, PipelineError> {
    let owned: PathBuf = path.to_path_buf();
    Ok(match blocking(move || read_category_rows(&owned)).await? {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "no category rows read");
            Vec::new()
        }
    })
}

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(file = %path.display(), error = %e, "could not remove temporary file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_rows_map_field_for_field() {
        let updates = into_updates(vec![CategoryRow {
            item_code: "1".to_owned(),
            general_category: "מזון".to_owned(),
            sub_category: "חלב".to_owned(),
            specific_category: "יוגורט".to_owned(),
        }]);
        assert_eq!(
            updates,
            vec![ItemCategoryUpdate {
                item_code: "1".to_owned(),
                general_category: "מזון".to_owned(),
                sub_category: "חלב".to_owned(),
                specific_category: "יוגורט".to_owned(),
            }]
        );
    }

    #[tokio::test]
    async fn missing_interpreter_is_a_classifier_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ClassifierConfig {
            python: "pricesync-no-such-interpreter".to_owned(),
            script: dir.path().join("classify.py"),
            model: dir.path().join("model.bin"),
            input_csv: dir.path().join("in.csv"),
            output_csv: dir.path().join("out.csv"),
        };
        let err = run_classifier(&config).await.unwrap_err();
        assert!(matches!(err, PipelineError::Classifier(_)));
    }

    #[tokio::test]
    async fn unreadable_output_yields_no_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rows = read_rows(&dir.path().join("absent.csv")).await.expect("read");
        assert!(rows.is_empty());
    }
}
