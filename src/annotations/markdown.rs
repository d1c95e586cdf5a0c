//! Markdown rendering of an annotation aggregate
//!
//! Layout: an `## Annotations` heading, an optional metadata block closed by
//! a horizontal rule, then one block-quoted entry per annotation in sequence
//! order, each closed by its own rule. Highlighted text is quoted verbatim,
//! comments follow as plain paragraphs.

use crate::config::Settings;

use super::types::ItemAnnotationData;

/// Output toggles; each independently enables its fragment
#[derive(Debug, Clone)]
pub struct FormatOptions {
    pub include_page_numbers: bool,
    pub include_tags: bool,
    pub use_color_emoji: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            include_page_numbers: true,
            include_tags: true,
            use_color_emoji: true,
        }
    }
}

impl From<&Settings> for FormatOptions {
    fn from(settings: &Settings) -> Self {
        FormatOptions {
            include_page_numbers: settings.include_page_numbers,
            include_tags: settings.include_tags,
            use_color_emoji: settings.use_color_emoji,
        }
    }
}

/// Render the aggregate as a single markdown document
pub fn format_markdown(data: &ItemAnnotationData, options: &FormatOptions) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("## Annotations".to_string());
    lines.push(String::new());

    if let Some(creators) = &data.item_creators {
        lines.push(format!("**Authors:** {creators}"));
    }
    if let Some(date) = &data.item_date {
        lines.push(format!("**Date:** {date}"));
    }
    if let Some(doi) = &data.item_doi {
        lines.push(format!("**DOI:** {doi}"));
    }
    if data.item_creators.is_some() || data.item_date.is_some() || data.item_doi.is_some() {
        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());
    }

    for annot in &data.annotations {
        let color_prefix = if options.use_color_emoji {
            format!("{} ", annot.color_emoji)
        } else {
            String::new()
        };

        // Page marker, as a deep link into the reader when one exists
        let page_info = match &annot.page_label {
            Some(label) if options.include_page_numbers => match &annot.zotero_link {
                Some(link) => format!(" [*(p.{label})*]({link})"),
                None => format!(" *(p.{label})*"),
            },
            _ => String::new(),
        };

        if annot.is_image {
            lines.push(format!(
                "> {color_prefix}\u{1F4F7} Figure annotation{page_info}"
            ));
            if let Some(comment) = &annot.comment {
                lines.push(String::new());
                lines.push(comment.clone());
            }
        } else if !annot.text.is_empty() {
            let mut quoted: Vec<String> = annot
                .text
                .split('\n')
                .map(|line| format!("> {line}"))
                .collect();
            quoted[0] = format!("> {color_prefix}{}{page_info}", &quoted[0][2..]);
            lines.push(quoted.join("\n"));

            if let Some(comment) = &annot.comment {
                lines.push(String::new());
                lines.push(comment.clone());
            }
        } else if let Some(comment) = &annot.comment {
            // Comment-only entries keep their comment; there is just no
            // quote block above it
            lines.push(comment.clone());
        }

        if options.include_tags && !annot.tags.is_empty() {
            lines.push(String::new());
            let tags: Vec<String> = annot.tags.iter().map(|t| format!("#{t}")).collect();
            lines.push(format!("Tags: {}", tags.join(" ")));
        }

        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.join("\n").trim().to_string()
}
