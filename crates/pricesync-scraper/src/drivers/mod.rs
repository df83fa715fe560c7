//! Source drivers: one per chain portal.
//!
//! A driver knows how to authenticate against its portal and list the feed
//! files it publishes. Downloads are done separately by
//! [`crate::retrieval::RetrievalService`], replaying the driver's session
//! cookies when it exposes [`SessionCredentials`].

pub(crate) mod html;
pub mod rami_levi;
pub mod shufersal;
pub mod victory;

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use pricesync_core::{FileDescriptor, FileKind, SourceConfig};
use regex::Regex;

use crate::error::ScraperError;
use crate::session::{Session, SessionCookie};

pub use rami_levi::RamiLeviDriver;
pub use shufersal::ShufersalDriver;
pub use victory::VictoryDriver;

/// Portal-specific file discovery.
#[async_trait]
pub trait SourceDriver: Send + Sync {
    /// Stable short name, also used as the download subdirectory.
    fn name(&self) -> &str;

    /// Establish whatever session state the portal needs. Safe to call
    /// more than once per session.
    async fn authenticate(&mut self, session: &Session) -> Result<(), ScraperError>;

    /// List files of `kind` uploaded at most `max_age_hours` ago.
    async fn discover_files(
        &mut self,
        session: &Session,
        kind: FileKind,
        max_age_hours: i64,
    ) -> Result<Vec<FileDescriptor>, ScraperError>;

    /// Cookies that downloads must replay, when the portal requires them.
    fn session_credentials(&self) -> Option<&dyn SessionCredentials> {
        None
    }
}

/// Session cookies captured by a driver during discovery.
pub trait SessionCredentials: Send + Sync {
    fn cookies(&self) -> Vec<SessionCookie>;
}

/// The drivers for every supported chain, in run order.
#[must_use]
pub fn default_drivers(sources: &SourceConfig) -> Vec<Box<dyn SourceDriver>> {
    vec![
        Box::new(RamiLeviDriver::new(
            &sources.rami_levi_login_url,
            &sources.rami_levi_files_url,
            &sources.rami_levi_username,
        )),
        Box::new(ShufersalDriver::new(&sources.shufersal_base_url)),
        Box::new(VictoryDriver::new(&sources.victory_base_url)),
    ]
}

// ---------------------------------------------------------------------------
// Shared filename rules
// ---------------------------------------------------------------------------

const UPLOAD_TIME_FORMAT: &str = "%Y%m%d%H%M";

/// `...-202401020300.gz`
pub(crate) static GZ_SUFFIX_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(\d{12})\.gz$").expect("valid regex"));

/// `...-202401020300-...`
pub(crate) static DASHED_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(\d{12})-").expect("valid regex"));

/// Parse the 12-digit upload time captured by `pattern`'s first group.
pub(crate) fn upload_time(file_name: &str, pattern: &Regex) -> Option<NaiveDateTime> {
    let digits = pattern.captures(file_name)?.get(1)?.as_str();
    NaiveDateTime::parse_from_str(digits, UPLOAD_TIME_FORMAT).ok()
}

/// Applies the timestamp, age, and dedupe rules to candidate files.
pub(crate) struct FileWindow<'a> {
    source: &'a str,
    kind: FileKind,
    max_age_hours: i64,
    now: NaiveDateTime,
    timestamp: &'a Regex,
    seen: HashSet<String>,
    accepted: Vec<FileDescriptor>,
}

impl<'a> FileWindow<'a> {
    pub(crate) fn new(
        source: &'a str,
        kind: FileKind,
        max_age_hours: i64,
        timestamp: &'a Regex,
    ) -> Self {
        Self::at(source, kind, max_age_hours, timestamp, Local::now().naive_local())
    }

    pub(crate) fn at(
        source: &'a str,
        kind: FileKind,
        max_age_hours: i64,
        timestamp: &'a Regex,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            source,
            kind,
            max_age_hours,
            now,
            timestamp,
            seen: HashSet::new(),
            accepted: Vec::new(),
        }
    }

    /// Offer one file whose kind already matched. Returns `true` if kept.
    pub(crate) fn offer(&mut self, file_name: &str, download_url: String) -> bool {
        if self.seen.contains(file_name) {
            return false;
        }
        let Some(uploaded_at) = upload_time(file_name, self.timestamp) else {
            tracing::warn!(
                source = self.source,
                file = file_name,
                "skipping file with unparseable upload time"
            );
            return false;
        };

        let descriptor = FileDescriptor {
            file_name: file_name.to_owned(),
            download_url,
            kind: self.kind,
            uploaded_at,
        };
        if !descriptor.is_within(self.now, self.max_age_hours) {
            tracing::debug!(
                source = self.source,
                file = file_name,
                age_hours = descriptor.age_hours(self.now),
                "skipping file outside lookback window"
            );
            return false;
        }

        tracing::debug!(source = self.source, file = file_name, "file selected");
        self.seen.insert(descriptor.file_name.clone());
        self.accepted.push(descriptor);
        true
    }

    pub(crate) fn into_files(self) -> Vec<FileDescriptor> {
        self.accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid datetime")
    }

    #[test]
    fn upload_time_reads_twelve_digit_group() {
        let parsed = upload_time("PriceFull7290058140886-001-202401020300.gz", &GZ_SUFFIX_TIMESTAMP);
        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2024, 1, 2).and_then(|d| d.and_hms_opt(3, 0, 0))
        );
    }

    #[test]
    fn upload_time_rejects_impossible_dates() {
        assert!(upload_time("Price1-001-202413990000.gz", &GZ_SUFFIX_TIMESTAMP).is_none());
        assert!(upload_time("Price1-001.gz", &GZ_SUFFIX_TIMESTAMP).is_none());
    }

    #[test]
    fn dashed_pattern_finds_inner_timestamp() {
        let parsed = upload_time(
            "PriceFull7290696200003-001-202401020300-000.xml.gz",
            &DASHED_TIMESTAMP,
        );
        assert!(parsed.is_some());
        assert!(upload_time(
            "PriceFull7290696200003-001-202401020300-000.xml.gz",
            &GZ_SUFFIX_TIMESTAMP
        )
        .is_none());
    }

    #[test]
    fn window_filters_age_and_dedupes() {
        let mut window = FileWindow::at("test", FileKind::Price, 24, &GZ_SUFFIX_TIMESTAMP, now());

        assert!(window.offer("Price1-001-202401020300.gz", "u1".to_owned()));
        assert!(!window.offer("Price1-001-202401020300.gz", "u1-again".to_owned()));
        assert!(!window.offer("Price1-002-202312300300.gz", "old".to_owned()));
        assert!(!window.offer("Price1-003-garbage.gz", "bad".to_owned()));

        let files = window.into_files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].download_url, "u1");
        assert_eq!(files[0].kind, FileKind::Price);
    }

    #[test]
    fn default_drivers_cover_every_chain() {
        let sources = SourceConfig {
            rami_levi_login_url: "http://localhost/login".to_owned(),
            rami_levi_files_url: "http://localhost/file".to_owned(),
            rami_levi_username: "RamiLevi".to_owned(),
            shufersal_base_url: "http://localhost/".to_owned(),
            victory_base_url: "http://localhost/".to_owned(),
        };
        let names: Vec<String> = default_drivers(&sources)
            .iter()
            .map(|d| d.name().to_owned())
            .collect();
        assert_eq!(names, vec!["rami_levi", "shufersal", "victory"]);
    }
}
