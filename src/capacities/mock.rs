//! Mock API client for tests

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::client::CapacitiesApi;
use super::types::{SaveWeblinkParams, SaveWeblinkResponse, SpaceInfo};

/// Records every call; never touches the network
#[derive(Default)]
pub struct MockCapacities {
    pub saved: Mutex<Vec<SaveWeblinkParams>>,
    pub daily_notes: Mutex<Vec<String>>,
    fail_next: Mutex<Option<(u16, String)>>,
}

impl MockCapacities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `save_weblink` call fail with an API error
    pub fn fail_next(&self, status: u16, body: &str) {
        *self.fail_next.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn saved_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

#[async_trait]
impl CapacitiesApi for MockCapacities {
    async fn save_weblink(&self, params: SaveWeblinkParams) -> Result<SaveWeblinkResponse> {
        if let Some((status, body)) = self.fail_next.lock().unwrap().take() {
            return Err(Error::Api {
                status,
                message: format!("Capacities API error: {status} - {body}"),
            });
        }

        let mut saved = self.saved.lock().unwrap();
        saved.push(params.clone());

        Ok(SaveWeblinkResponse {
            space_id: "space-1".to_string(),
            id: format!("obj-{}", saved.len()),
            structure_id: "RootSpace".to_string(),
            title: params.title_overwrite.unwrap_or_default(),
            description: params.description_overwrite.unwrap_or_default(),
            tags: params.tags.unwrap_or_default(),
        })
    }

    async fn save_to_daily_note(&self, md_text: &str, _no_timestamp: Option<bool>) -> Result<()> {
        self.daily_notes.lock().unwrap().push(md_text.to_string());
        Ok(())
    }

    async fn spaces(&self) -> Result<Vec<SpaceInfo>> {
        Ok(vec![SpaceInfo {
            id: "space-1".to_string(),
            title: "Mock Space".to_string(),
            icon: None,
        }])
    }
}
