//! Snapshot model of a Zotero item graph
//!
//! A top-level reference item owns file attachments; PDF attachments carry
//! the annotations made in the reader. Loading produces owned values, so
//! extraction and formatting stay pure and deterministic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Library a top-level item belongs to
///
/// The local-selection URI fallback only applies to personal libraries;
/// group-library items without a URL or DOI get no link at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryKind {
    User,
    Group,
}

/// Annotation kind as recorded by the PDF reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Highlight,
    Underline,
    Note,
    /// Rectangular region annotation, rendered as a figure reference
    Image,
    /// Freehand drawing; carries nothing this pipeline can render
    Ink,
}

impl AnnotationKind {
    /// Kinds whose content is the highlighted/entered text
    pub fn is_text_kind(self) -> bool {
        matches!(self, Self::Highlight | Self::Underline | Self::Note)
    }
}

/// A raw annotation row from a PDF attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAnnotation {
    pub key: String,
    /// Owning PDF attachment key, used for deep linking
    #[serde(rename = "parentKey")]
    pub parent_key: String,
    pub kind: AnnotationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Highlight color as a hex string, when the reader recorded one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "pageLabel", skip_serializing_if = "Option::is_none")]
    pub page_label: Option<String>,
    /// Opaque position string; lexical order recovers reading order
    #[serde(rename = "sortIndex", skip_serializing_if = "Option::is_none")]
    pub sort_index: Option<String>,
    /// Zero-based page index parsed from the position payload
    #[serde(rename = "pageIndex", skip_serializing_if = "Option::is_none")]
    pub page_index: Option<u32>,
    #[serde(rename = "dateAdded", skip_serializing_if = "Option::is_none")]
    pub date_added: Option<DateTime<Utc>>,
    #[serde(rename = "dateModified", skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A file attachment on a top-level item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Source URL the file was saved from, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "contentType", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub annotations: Vec<RawAnnotation>,
}

impl Attachment {
    pub fn is_pdf(&self) -> bool {
        self.content_type.as_deref() == Some("application/pdf")
    }
}

/// One creator (author, editor, ...) of an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creator {
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
}

impl Creator {
    /// `"First Last"`, trimmed; `None` when both parts are empty
    pub fn display_name(&self) -> Option<String> {
        let name = format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

/// A top-level reference item with its attachments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub key: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub creators: Vec<Creator>,
    pub library: LibraryKind,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Item {
    /// PDF attachments only; the extractor ignores everything else
    pub fn pdf_attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(|a| a.is_pdf())
    }
}
