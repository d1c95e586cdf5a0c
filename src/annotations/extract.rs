//! Annotation extraction and aggregation
//!
//! Collects the raw annotations of every PDF attachment on one item,
//! classifies them, attaches deep links and merges them into a single
//! sequence ordered by sort index. Extraction never fails: items with
//! nothing to sync come back as `None` or as an empty aggregate, and the
//! sync layer classifies those.

use crate::library::{AnnotationKind, Attachment, Item, LibraryKind, RawAnnotation};

use super::color::{color_emoji, DEFAULT_COLOR};
use super::types::{FormattedAnnotation, ItemAnnotationData};

/// Check whether a URL points directly at a PDF file.
///
/// Direct links make Capacities ingest the target as a MediaPDF object
/// instead of a generic web resource. Matches a `.pdf` extension
/// (case-insensitive) and the `/pdf/` paths of the common preprint hosts.
pub fn is_pdf_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();

    if lower.ends_with(".pdf") {
        return true;
    }
    if lower.contains("arxiv.org/pdf/") {
        return true;
    }
    if lower.contains("/pdf/")
        && (lower.contains("arxiv") || lower.contains("biorxiv") || lower.contains("medrxiv"))
    {
        return true;
    }

    false
}

/// Deep link reopening an annotation at its exact location.
/// Page numbers are one-based in the link; the position payload is zero-based.
fn deep_link(attachment_key: &str, annotation_key: &str, page_index: Option<u32>) -> String {
    let annotation = urlencoding::encode(annotation_key);
    match page_index {
        Some(index) => format!(
            "zotero://open-pdf/library/items/{}?page={}&annotation={}",
            urlencoding::encode(attachment_key),
            index + 1,
            annotation
        ),
        None => format!(
            "zotero://open-pdf/library/items/{}?annotation={}",
            urlencoding::encode(attachment_key),
            annotation
        ),
    }
}

/// Local selection URI for an item in a personal library
fn select_uri(item_key: &str) -> String {
    format!(
        "zotero://select/library/items/{}",
        urlencoding::encode(item_key)
    )
}

/// Raw annotations of one attachment; empty when it is not a PDF or has none
pub fn extract_from_attachment(attachment: &Attachment) -> Vec<RawAnnotation> {
    if !attachment.is_pdf() {
        return Vec::new();
    }
    attachment.annotations.clone()
}

/// Classify one raw annotation, applying the retention rules:
/// image annotations are always kept, text kinds need text or a comment,
/// ink (freehand) is dropped.
fn format_annotation(raw: &RawAnnotation) -> Option<FormattedAnnotation> {
    let link = deep_link(&raw.parent_key, &raw.key, raw.page_index);

    let is_image = match raw.kind {
        AnnotationKind::Image => true,
        AnnotationKind::Ink => return None,
        kind if kind.is_text_kind() => {
            if raw.text.is_none() && raw.comment.is_none() {
                return None;
            }
            false
        }
        _ => return None,
    };

    Some(FormattedAnnotation {
        text: if is_image {
            String::new()
        } else {
            raw.text.clone().unwrap_or_default()
        },
        comment: raw.comment.clone(),
        color: raw.color.clone().unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        color_emoji: color_emoji(raw.color.as_deref()).to_string(),
        page_label: raw.page_label.clone(),
        page_index: raw.page_index,
        tags: raw.tags.clone(),
        sort_index: raw.sort_index.clone().unwrap_or_default(),
        zotero_link: Some(link),
        is_image,
    })
}

/// Aggregate all annotations of an item's PDF attachments.
///
/// Returns `None` when the item has no PDF attachments at all. Annotations
/// from every attachment are merged into one sequence and sorted by sort
/// index, so inter-attachment order is decided entirely by that key.
pub fn extract_from_item(item: &Item) -> Option<ItemAnnotationData> {
    let pdf_attachments: Vec<_> = item.pdf_attachments().collect();
    if pdf_attachments.is_empty() {
        return None;
    }

    let mut annotations = Vec::new();
    let mut pdf_url = None;

    for attachment in &pdf_attachments {
        // Last matching attachment wins when several carry a direct link
        if let Some(url) = &attachment.url {
            if is_pdf_url(url) {
                pdf_url = Some(url.clone());
            }
        }

        annotations.extend(
            extract_from_attachment(attachment)
                .iter()
                .filter_map(format_annotation),
        );
    }

    annotations.sort_by(|a, b| a.sort_index.cmp(&b.sort_index));

    let item_creators = {
        let names: Vec<_> = item
            .creators
            .iter()
            .filter_map(|c| c.display_name())
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    };

    // URL field, else DOI link, else a local selection URI for personal
    // libraries only
    let item_url = item
        .url
        .clone()
        .or_else(|| item.doi.as_ref().map(|doi| format!("https://doi.org/{doi}")))
        .or_else(|| {
            if item.library == LibraryKind::User {
                Some(select_uri(&item.key))
            } else {
                None
            }
        });

    Some(ItemAnnotationData {
        item_key: item.key.clone(),
        item_title: item.title.clone(),
        item_url,
        item_doi: item.doi.clone(),
        item_creators,
        item_date: item.date.clone(),
        pdf_title: pdf_attachments[0].title.clone(),
        pdf_url,
        annotations,
    })
}

/// Submission URL priority: direct-PDF URL, then a direct-PDF item URL,
/// then the DOI link, then the plain URL field, with the local selection
/// URI as last resort.
pub fn best_submission_url(data: &ItemAnnotationData) -> String {
    if let Some(pdf_url) = &data.pdf_url {
        return pdf_url.clone();
    }

    if let Some(url) = &data.item_url {
        if !url.starts_with("zotero://") && is_pdf_url(url) {
            return url.clone();
        }
    }

    if let Some(doi) = &data.item_doi {
        return format!("https://doi.org/{doi}");
    }

    if let Some(url) = &data.item_url {
        if !url.starts_with("zotero://") {
            return url.clone();
        }
    }

    data.item_url
        .clone()
        .unwrap_or_else(|| select_uri(&data.item_key))
}

/// Weblink description: creators plus a parenthesized date, capped at 1000
/// characters.
pub fn build_description(data: &ItemAnnotationData) -> String {
    let mut parts = Vec::new();
    if let Some(creators) = &data.item_creators {
        parts.push(creators.clone());
    }
    if let Some(date) = &data.item_date {
        parts.push(format!("({date})"));
    }

    parts.join(" ").chars().take(1000).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::library::{Attachment, Creator, LibraryKind};

    pub(crate) fn highlight(
        key: &str,
        parent: &str,
        sort_index: &str,
        color: &str,
        text: &str,
    ) -> RawAnnotation {
        RawAnnotation {
            key: key.to_string(),
            parent_key: parent.to_string(),
            kind: AnnotationKind::Highlight,
            text: Some(text.to_string()),
            comment: None,
            color: Some(color.to_string()),
            page_label: None,
            sort_index: Some(sort_index.to_string()),
            page_index: None,
            date_added: None,
            date_modified: None,
            tags: vec![],
        }
    }

    pub(crate) fn pdf_attachment(key: &str, annotations: Vec<RawAnnotation>) -> Attachment {
        Attachment {
            key: key.to_string(),
            title: Some("Full Text PDF".to_string()),
            url: None,
            content_type: Some("application/pdf".to_string()),
            annotations,
        }
    }

    pub(crate) fn item(key: &str, attachments: Vec<Attachment>) -> Item {
        Item {
            key: key.to_string(),
            title: "A Paper".to_string(),
            url: None,
            doi: None,
            date: None,
            creators: vec![],
            library: LibraryKind::User,
            attachments,
        }
    }

    #[test]
    fn test_is_pdf_url() {
        assert!(is_pdf_url("https://arxiv.org/pdf/2301.00001"));
        assert!(is_pdf_url("https://example.com/paper.PDF"));
        assert!(is_pdf_url("https://www.biorxiv.org/content/pdf/2024.01.01"));
        assert!(!is_pdf_url("https://example.com/about"));
        assert!(!is_pdf_url("https://example.com/pdf/viewer"));
    }

    #[test]
    fn test_non_pdf_attachment_yields_nothing() {
        let attachment = Attachment {
            key: "ATTHTML1".to_string(),
            title: None,
            url: None,
            content_type: Some("text/html".to_string()),
            annotations: vec![highlight("AN1", "ATTHTML1", "00001|000100", "#ffd400", "x")],
        };
        assert!(extract_from_attachment(&attachment).is_empty());

        let pdf = pdf_attachment(
            "ATTACH01",
            vec![highlight("AN1", "ATTACH01", "00001|000100", "#ffd400", "x")],
        );
        assert_eq!(extract_from_attachment(&pdf).len(), 1);
    }

    #[test]
    fn test_no_pdf_attachments_is_absent() {
        let mut it = item("ITEM0001", vec![]);
        assert!(extract_from_item(&it).is_none());

        it.attachments.push(Attachment {
            key: "ATTHTML1".to_string(),
            title: None,
            url: None,
            content_type: Some("text/html".to_string()),
            annotations: vec![],
        });
        assert!(extract_from_item(&it).is_none());
    }

    #[test]
    fn test_merge_and_sort_across_attachments() {
        // Reading order must come from the sort index, not from attachment
        // enumeration order
        let it = item(
            "ITEM0001",
            vec![
                pdf_attachment(
                    "ATTACH01",
                    vec![highlight("AN3", "ATTACH01", "00003|000100", "#ffd400", "third")],
                ),
                pdf_attachment(
                    "ATTACH02",
                    vec![
                        highlight("AN1", "ATTACH02", "00001|000100", "#ffd400", "first"),
                        highlight("AN2", "ATTACH02", "00002|000100", "#ffd400", "second"),
                    ],
                ),
            ],
        );

        let data = extract_from_item(&it).unwrap();
        let texts: Vec<_> = data.annotations.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_sort_index_sorts_first() {
        let mut unindexed = highlight("AN0", "ATTACH01", "", "#ffd400", "front matter");
        unindexed.sort_index = None;
        let it = item(
            "ITEM0001",
            vec![pdf_attachment(
                "ATTACH01",
                vec![
                    highlight("AN1", "ATTACH01", "00001|000100", "#ffd400", "body"),
                    unindexed,
                ],
            )],
        );

        let data = extract_from_item(&it).unwrap();
        assert_eq!(data.annotations[0].text, "front matter");
    }

    #[test]
    fn test_retention_rules() {
        let mut empty = highlight("AN1", "ATTACH01", "00001|000100", "#ffd400", "");
        empty.text = None;

        let mut comment_only = highlight("AN2", "ATTACH01", "00002|000100", "#ffd400", "");
        comment_only.text = None;
        comment_only.comment = Some("worth keeping".to_string());

        let mut image = highlight("AN3", "ATTACH01", "00003|000100", "#5fb236", "");
        image.kind = AnnotationKind::Image;
        image.text = None;

        let mut ink = highlight("AN4", "ATTACH01", "00004|000100", "#ff6666", "scribble");
        ink.kind = AnnotationKind::Ink;

        let it = item(
            "ITEM0001",
            vec![pdf_attachment("ATTACH01", vec![empty, comment_only, image, ink])],
        );

        let data = extract_from_item(&it).unwrap();
        assert_eq!(data.annotations.len(), 2);
        assert_eq!(data.annotations[0].comment.as_deref(), Some("worth keeping"));
        assert!(data.annotations[1].is_image);
        assert!(data.annotations[1].text.is_empty());
    }

    #[test]
    fn test_deep_link_page_numbers_are_one_based() {
        let mut annot = highlight("ANNOT001", "ATTACH01", "00001|000100", "#ffd400", "x");
        annot.page_index = Some(2);
        let it = item("ITEM0001", vec![pdf_attachment("ATTACH01", vec![annot])]);

        let data = extract_from_item(&it).unwrap();
        assert_eq!(
            data.annotations[0].zotero_link.as_deref(),
            Some("zotero://open-pdf/library/items/ATTACH01?page=3&annotation=ANNOT001")
        );
    }

    #[test]
    fn test_deep_link_without_position_has_no_page() {
        let it = item(
            "ITEM0001",
            vec![pdf_attachment(
                "ATTACH01",
                vec![highlight("ANNOT001", "ATTACH01", "00001|000100", "#ffd400", "x")],
            )],
        );

        let data = extract_from_item(&it).unwrap();
        assert_eq!(
            data.annotations[0].zotero_link.as_deref(),
            Some("zotero://open-pdf/library/items/ATTACH01?annotation=ANNOT001")
        );
    }

    #[test]
    fn test_last_direct_pdf_url_wins() {
        let mut first = pdf_attachment("ATTACH01", vec![]);
        first.url = Some("https://arxiv.org/pdf/1111.0001".to_string());
        let mut second = pdf_attachment("ATTACH02", vec![]);
        second.url = Some("https://arxiv.org/pdf/2222.0002".to_string());

        let it = item("ITEM0001", vec![first, second]);
        let data = extract_from_item(&it).unwrap();
        assert_eq!(data.pdf_url.as_deref(), Some("https://arxiv.org/pdf/2222.0002"));
    }

    #[test]
    fn test_item_url_resolution_priority() {
        let base = item("ITEM0001", vec![pdf_attachment("ATTACH01", vec![])]);

        let mut with_url = base.clone();
        with_url.url = Some("https://example.com/paper".to_string());
        with_url.doi = Some("10.1/x".to_string());
        assert_eq!(
            extract_from_item(&with_url).unwrap().item_url.as_deref(),
            Some("https://example.com/paper")
        );

        let mut doi_only = base.clone();
        doi_only.doi = Some("10.1/x".to_string());
        assert_eq!(
            extract_from_item(&doi_only).unwrap().item_url.as_deref(),
            Some("https://doi.org/10.1/x")
        );

        // Personal library falls back to the local selection URI
        assert_eq!(
            extract_from_item(&base).unwrap().item_url.as_deref(),
            Some("zotero://select/library/items/ITEM0001")
        );

        let mut group = base.clone();
        group.library = LibraryKind::Group;
        assert!(extract_from_item(&group).unwrap().item_url.is_none());
    }

    #[test]
    fn test_creator_display_string() {
        let mut it = item("ITEM0001", vec![pdf_attachment("ATTACH01", vec![])]);
        it.creators = vec![
            Creator {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
            },
            Creator {
                first_name: String::new(),
                last_name: String::new(),
            },
            Creator {
                first_name: "Alan".to_string(),
                last_name: "Turing".to_string(),
            },
        ];

        let data = extract_from_item(&it).unwrap();
        assert_eq!(data.item_creators.as_deref(), Some("Ada Lovelace, Alan Turing"));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let it = item(
            "ITEM0001",
            vec![pdf_attachment(
                "ATTACH01",
                vec![
                    highlight("AN2", "ATTACH01", "00002|000100", "#5fb236", "B"),
                    highlight("AN1", "ATTACH01", "00001|000100", "#ffd400", "A"),
                ],
            )],
        );

        assert_eq!(extract_from_item(&it), extract_from_item(&it));
    }

    #[test]
    fn test_best_submission_url_priority() {
        let mut data = extract_from_item(&item(
            "ITEM0001",
            vec![pdf_attachment("ATTACH01", vec![])],
        ))
        .unwrap();

        // Last resort: the local selection URI
        assert_eq!(
            best_submission_url(&data),
            "zotero://select/library/items/ITEM0001"
        );

        data.item_url = Some("https://example.com/paper".to_string());
        assert_eq!(best_submission_url(&data), "https://example.com/paper");

        data.item_doi = Some("10.1/x".to_string());
        assert_eq!(best_submission_url(&data), "https://doi.org/10.1/x");

        // A direct-PDF item URL beats the DOI link
        data.item_url = Some("https://example.com/paper.pdf".to_string());
        assert_eq!(best_submission_url(&data), "https://example.com/paper.pdf");

        data.pdf_url = Some("https://arxiv.org/pdf/1706.03762".to_string());
        assert_eq!(best_submission_url(&data), "https://arxiv.org/pdf/1706.03762");
    }

    #[test]
    fn test_build_description() {
        let mut data = extract_from_item(&item(
            "ITEM0001",
            vec![pdf_attachment("ATTACH01", vec![])],
        ))
        .unwrap();
        assert_eq!(build_description(&data), "");

        data.item_creators = Some("Ada Lovelace".to_string());
        data.item_date = Some("1843".to_string());
        assert_eq!(build_description(&data), "Ada Lovelace (1843)");

        data.item_creators = Some("x".repeat(2000));
        assert_eq!(build_description(&data).chars().count(), 1000);
    }
}
