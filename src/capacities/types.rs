//! Capacities API wire types

use serde::{Deserialize, Serialize};

pub const API_BASE_URL: &str = "https://api.capacities.io";

/// Limits enforced at the transport boundary
pub const MAX_TITLE_CHARS: usize = 500;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;
pub const MAX_TAGS: usize = 30;
pub const MAX_MD_TEXT_CHARS: usize = 200_000;

/// Parameters for a weblink submission; the client supplies the space id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveWeblinkParams {
    pub url: String,
    pub title_overwrite: Option<String>,
    pub description_overwrite: Option<String>,
    pub tags: Option<Vec<String>>,
    pub md_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveWeblinkRequest {
    #[serde(rename = "spaceId")]
    pub space_id: String,
    pub url: String,
    #[serde(rename = "titleOverwrite", skip_serializing_if = "Option::is_none")]
    pub title_overwrite: Option<String>,
    #[serde(rename = "descriptionOverwrite", skip_serializing_if = "Option::is_none")]
    pub description_overwrite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(rename = "mdText", skip_serializing_if = "Option::is_none")]
    pub md_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveWeblinkResponse {
    #[serde(rename = "spaceId")]
    pub space_id: String,
    pub id: String,
    #[serde(rename = "structureId")]
    pub structure_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyNoteRequest {
    #[serde(rename = "spaceId")]
    pub space_id: String,
    #[serde(rename = "mdText")]
    pub md_text: String,
    #[serde(rename = "noTimeStamp", skip_serializing_if = "Option::is_none")]
    pub no_time_stamp: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceInfo {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<SpaceIcon>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceIcon {
    #[serde(rename = "type")]
    pub kind: String,
    pub val: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "colorHex", skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacesResponse {
    pub spaces: Vec<SpaceInfo>,
}
