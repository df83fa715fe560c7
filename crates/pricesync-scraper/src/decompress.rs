//! Gzip → XML conversion of downloaded feed files.
//!
//! Blocking file I/O; async callers should run these on
//! `tokio::task::spawn_blocking`.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

const CHUNK_SIZE: usize = 4096;

/// Outcome of [`convert_directory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Decompress `gz_path` into `xml_path`.
///
/// Returns `false` on any failure (logged at `warn!`). A failed conversion
/// removes whatever part of `xml_path` was written.
pub fn convert(gz_path: &Path, xml_path: &Path) -> bool {
    match decompress(gz_path, xml_path) {
        Ok(bytes) => {
            tracing::debug!(
                from = %gz_path.display(),
                to = %xml_path.display(),
                bytes,
                "decompressed"
            );
            true
        }
        Err(e) => {
            tracing::warn!(path = %gz_path.display(), error = %e, "decompression failed");
            let _ = fs::remove_file(xml_path);
            false
        }
    }
}

fn decompress(gz_path: &Path, xml_path: &Path) -> io::Result<u64> {
    let mut decoder = GzDecoder::new(BufReader::new(File::open(gz_path)?));
    let mut out = BufWriter::new(File::create(xml_path)?);
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = decoder.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        total += n as u64;
    }
    out.flush()?;
    Ok(total)
}

/// Output path for a downloaded file: `.gz` stripped, `.xml` ensured.
#[must_use]
pub fn xml_path_for(gz_path: &Path) -> PathBuf {
    let name = gz_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".gz").unwrap_or(&name);
    let xml_name = if stem.to_ascii_lowercase().ends_with(".xml") {
        stem.to_owned()
    } else {
        format!("{stem}.xml")
    };
    gz_path.with_file_name(xml_name)
}

/// Convert every `*.gz` in `dir`, deleting each archive afterwards whether
/// or not it converted.
///
/// An unreadable directory counts as nothing converted.
pub fn convert_directory(dir: &Path) -> ConversionSummary {
    let mut summary = ConversionSummary::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot read download directory");
            return summary;
        }
    };

    let mut archives: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "gz"))
        .collect();
    archives.sort();

    for gz_path in archives {
        if convert(&gz_path, &xml_path_for(&gz_path)) {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }
        if let Err(e) = fs::remove_file(&gz_path) {
            tracing::warn!(path = %gz_path.display(), error = %e, "could not delete archive");
        }
    }

    tracing::info!(
        dir = %dir.display(),
        succeeded = summary.succeeded,
        failed = summary.failed,
        "decompression finished"
    );
    summary
}
