//! Aggregated annotation model
//!
//! [`ItemAnnotationData`] is the unit of work for a sync attempt: one
//! reference item, all of its PDF attachments merged, annotations in
//! reading order. It is rebuilt from the library on every attempt and
//! never cached.

use serde::{Deserialize, Serialize};

/// A single annotation, normalized for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedAnnotation {
    /// Highlighted text; empty for image annotations
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Resolved hex color, falling back to yellow
    pub color: String,
    #[serde(rename = "colorEmoji")]
    pub color_emoji: String,
    #[serde(rename = "pageLabel", skip_serializing_if = "Option::is_none")]
    pub page_label: Option<String>,
    /// Zero-based page index; deep links render it one-based
    #[serde(rename = "pageIndex", skip_serializing_if = "Option::is_none")]
    pub page_index: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Lexical ordering key; the empty string sorts first
    #[serde(rename = "sortIndex")]
    pub sort_index: String,
    /// Deep link reopening the annotation in the Zotero reader
    #[serde(rename = "zoteroLink", skip_serializing_if = "Option::is_none")]
    pub zotero_link: Option<String>,
    /// Region/figure annotation rather than a text-bearing one
    #[serde(rename = "isImage")]
    pub is_image: bool,
}

/// Everything needed to submit one item's annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAnnotationData {
    #[serde(rename = "itemKey")]
    pub item_key: String,
    #[serde(rename = "itemTitle")]
    pub item_title: String,
    #[serde(rename = "itemUrl", skip_serializing_if = "Option::is_none")]
    pub item_url: Option<String>,
    #[serde(rename = "itemDoi", skip_serializing_if = "Option::is_none")]
    pub item_doi: Option<String>,
    /// Creator display names joined with `", "`
    #[serde(rename = "itemCreators", skip_serializing_if = "Option::is_none")]
    pub item_creators: Option<String>,
    #[serde(rename = "itemDate", skip_serializing_if = "Option::is_none")]
    pub item_date: Option<String>,
    /// Title of the first PDF attachment
    #[serde(rename = "pdfTitle", skip_serializing_if = "Option::is_none")]
    pub pdf_title: Option<String>,
    /// Direct-PDF source URL, when any attachment carries one
    #[serde(rename = "pdfUrl", skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    /// Sorted ascending by `sort_index`, lexically
    pub annotations: Vec<FormattedAnnotation>,
}
