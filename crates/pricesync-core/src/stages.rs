use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Named, independently tracked steps of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    InitialLoad,
    PricefullLoad,
    PriceLoad,
    StoreTableInit,
    ChainTableInit,
    ItemTableInit,
    TableSeeding,
    PriceUpdate,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 8] = [
        PipelineStage::InitialLoad,
        PipelineStage::PricefullLoad,
        PipelineStage::PriceLoad,
        PipelineStage::StoreTableInit,
        PipelineStage::ChainTableInit,
        PipelineStage::ItemTableInit,
        PipelineStage::TableSeeding,
        PipelineStage::PriceUpdate,
    ];

    /// Stored value of the `pipeline_stages.stage` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitialLoad => "INITIAL_LOAD",
            Self::PricefullLoad => "PRICEFULL_LOAD",
            Self::PriceLoad => "PRICE_LOAD",
            Self::StoreTableInit => "STORE_TABLE_INIT",
            Self::ChainTableInit => "CHAIN_TABLE_INIT",
            Self::ItemTableInit => "ITEM_TABLE_INIT",
            Self::TableSeeding => "TABLE_SEEDING",
            Self::PriceUpdate => "PRICE_UPDATE",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::UnknownStage(s.to_string()))
    }
}

/// Observed state of a stage in the ledger.
///
/// `Failed` is a row that exists but is not completed, which only happens
/// when a run explicitly reset it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    NotStarted,
    Completed,
    Failed,
}

impl StageStatus {
    /// Derives the status from an optional ledger row `(completed, updated_at)`.
    #[must_use]
    pub fn from_row(row: Option<(bool, DateTime<Utc>)>) -> Self {
        match row {
            None => Self::NotStarted,
            Some((true, _)) => Self::Completed,
            Some((false, _)) => Self::Failed,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}
