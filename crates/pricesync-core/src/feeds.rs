//! Descriptors for files published by the chain price portals.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Category of a published feed file, inferred from its name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Price,
    PriceFull,
    Promo,
    PromoFull,
    Store,
    Unknown,
}

impl FileKind {
    /// Infers the kind from a case-sensitive file name prefix.
    ///
    /// Longer prefixes win: `PriceFull7290...` is [`FileKind::PriceFull`],
    /// never [`FileKind::Price`].
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Self {
        if file_name.starts_with("PriceFull") {
            Self::PriceFull
        } else if file_name.starts_with("Price") {
            Self::Price
        } else if file_name.starts_with("PromoFull") {
            Self::PromoFull
        } else if file_name.starts_with("Promo") {
            Self::Promo
        } else if file_name.starts_with("Store") {
            Self::Store
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::PriceFull => "price_full",
            Self::Promo => "promo",
            Self::PromoFull => "promo_full",
            Self::Store => "store",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A downloadable file discovered by a source driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub file_name: String,
    pub download_url: String,
    pub kind: FileKind,
    /// Upload time embedded in the file name (portal local time).
    pub uploaded_at: NaiveDateTime,
}

impl FileDescriptor {
    /// Whole hours elapsed between the upload timestamp and `now`.
    #[must_use]
    pub fn age_hours(&self, now: NaiveDateTime) -> i64 {
        (now - self.uploaded_at).num_hours()
    }

    /// `true` when the file was uploaded at most `max_age_hours` before `now`.
    #[must_use]
    pub fn is_within(&self, now: NaiveDateTime, max_age_hours: i64) -> bool {
        self.age_hours(now) <= max_age_hours
    }
}
