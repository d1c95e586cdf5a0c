//! Sync result and option types

use serde::Serialize;

use crate::capacities::SaveWeblinkResponse;

/// Outcome of one sync attempt; built once, never mutated
#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    pub success: bool,
    #[serde(rename = "itemKey")]
    pub item_key: String,
    #[serde(rename = "itemTitle")]
    pub item_title: String,
    /// Remote object id, on success
    #[serde(rename = "capacitiesId", skip_serializing_if = "Option::is_none")]
    pub capacities_id: Option<String>,
    #[serde(rename = "structureId", skip_serializing_if = "Option::is_none")]
    pub structure_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncResult {
    pub fn succeeded(item_key: &str, item_title: &str, response: &SaveWeblinkResponse) -> Self {
        SyncResult {
            success: true,
            item_key: item_key.to_string(),
            item_title: item_title.to_string(),
            capacities_id: Some(response.id.clone()),
            structure_id: Some(response.structure_id.clone()),
            error: None,
        }
    }

    pub fn failed(item_key: &str, item_title: &str, error: impl std::fmt::Display) -> Self {
        SyncResult {
            success: false,
            item_key: item_key.to_string(),
            item_title: item_title.to_string(),
            capacities_id: None,
            structure_id: None,
            error: Some(error.to_string()),
        }
    }
}

/// Position within a running batch, reported before each attempt
#[derive(Debug, Clone, Serialize)]
pub struct SyncProgress {
    pub current: usize,
    pub total: usize,
    #[serde(rename = "currentItem", skip_serializing_if = "Option::is_none")]
    pub current_item: Option<String>,
}

pub type ProgressCallback = Box<dyn FnMut(SyncProgress) + Send>;

/// Options for a single sync attempt
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Re-sync even when the item is already in the processed set
    pub force: bool,
    /// Skip the processed-set lookup entirely
    pub skip_processed_check: bool,
}

/// Aggregate dedup-store statistics
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncStats {
    #[serde(rename = "processedCount")]
    pub processed_count: usize,
}
