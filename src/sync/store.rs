//! Processed-item tracking
//!
//! The dedup set lives inside the settings file as a JSON array string, the
//! same single-value shape the host preference store used. A corrupt or
//! missing value reads as the empty set. Entries are added only after a
//! successful remote submission and removed only by explicit user action.

use std::collections::BTreeSet;

use crate::config::SettingsStore;
use crate::error::Result;

use super::types::SyncStats;

/// View over the processed-item set in the settings store
pub struct ProcessedStore<'a> {
    settings: &'a SettingsStore,
}

impl<'a> ProcessedStore<'a> {
    pub fn new(settings: &'a SettingsStore) -> Self {
        Self { settings }
    }

    fn read(&self) -> BTreeSet<String> {
        parse(&self.settings.get().processed_items)
    }

    pub fn is_processed(&self, key: &str) -> bool {
        self.read().contains(key)
    }

    pub fn add(&self, key: &str) -> Result<()> {
        self.settings.update(|s| {
            let mut set = parse(&s.processed_items);
            set.insert(key.to_string());
            s.processed_items = serialize(&set);
        })
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.settings.update(|s| {
            let mut set = parse(&s.processed_items);
            set.remove(key);
            s.processed_items = serialize(&set);
        })
    }

    pub fn clear(&self) -> Result<()> {
        self.settings.update(|s| {
            s.processed_items = "[]".to_string();
        })
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            processed_count: self.read().len(),
        }
    }
}

fn parse(value: &str) -> BTreeSet<String> {
    serde_json::from_str::<Vec<String>>(value)
        .unwrap_or_default()
        .into_iter()
        .collect()
}

fn serialize(set: &BTreeSet<String>) -> String {
    serde_json::to_string(set).unwrap_or_else(|_| "[]".to_string())
}
