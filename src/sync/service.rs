//! Single-item sync
//!
//! The only state transition in a sync attempt is the processed-set
//! insertion after a successful submission. Nothing is written before the
//! remote call succeeds, so a failure needs no rollback and leaves the item
//! retryable.

use tracing::{info, warn};

use crate::annotations::{
    best_submission_url, build_description, extract_from_item, format_markdown, FormatOptions,
};
use crate::capacities::{CapacitiesApi, SaveWeblinkParams};
use crate::config::SettingsStore;
use crate::error::Error;
use crate::library::Item;

use super::store::ProcessedStore;
use super::types::{SyncOptions, SyncResult};

/// Tags attached to every weblink; DOI-bearing items also get "research"
const BASE_TAGS: [&str; 2] = ["zotero", "annotations"];

pub struct SyncService<'a> {
    settings: &'a SettingsStore,
    client: &'a dyn CapacitiesApi,
}

impl<'a> SyncService<'a> {
    pub fn new(settings: &'a SettingsStore, client: &'a dyn CapacitiesApi) -> Self {
        Self { settings, client }
    }

    pub(super) fn settings(&self) -> &'a SettingsStore {
        self.settings
    }

    /// Sync one item to Capacities
    ///
    /// Every exit produces a result record; guard failures never reach the
    /// network.
    pub async fn sync_item(&self, item: &Item, options: SyncOptions) -> SyncResult {
        let settings = self.settings.get();

        if !settings.is_configured() {
            return SyncResult::failed(&item.key, &item.title, Error::NotConfigured);
        }

        let processed = ProcessedStore::new(self.settings);
        if !options.force && !options.skip_processed_check && processed.is_processed(&item.key) {
            return SyncResult::failed(&item.key, &item.title, Error::AlreadySynced);
        }

        let Some(data) = extract_from_item(item) else {
            return SyncResult::failed(&item.key, &item.title, Error::NoPdfAttachments);
        };
        if data.annotations.is_empty() {
            return SyncResult::failed(&data.item_key, &data.item_title, Error::NoAnnotations);
        }

        let md_text = format_markdown(&data, &FormatOptions::from(&settings));
        let url = best_submission_url(&data);
        let description = build_description(&data);

        let mut tags: Vec<String> = BASE_TAGS.iter().map(|t| t.to_string()).collect();
        if data.item_doi.is_some() {
            tags.push("research".to_string());
        }

        let params = SaveWeblinkParams {
            url,
            title_overwrite: Some(data.item_title.clone()),
            description_overwrite: (!description.is_empty()).then_some(description),
            tags: Some(tags),
            md_text: Some(md_text),
        };

        match self.client.save_weblink(params).await {
            Ok(response) => {
                // A bookkeeping failure must not fail the sync; the remote
                // object already exists
                if let Err(e) = processed.add(&data.item_key) {
                    warn!("Failed to record processed item {}: {}", data.item_key, e);
                }
                info!("Synced {} as {}", data.item_key, response.id);
                SyncResult::succeeded(&data.item_key, &data.item_title, &response)
            }
            Err(e) => {
                warn!("Sync failed for {}: {}", data.item_key, e);
                SyncResult::failed(&data.item_key, &data.item_title, e)
            }
        }
    }
}
