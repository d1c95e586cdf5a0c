//! Annotation extraction and markdown conversion
//!
//! Turns the raw annotation rows of one reference item into a single
//! aggregate in reading order, then renders that aggregate as the markdown
//! body submitted to Capacities.

mod color;
mod extract;
mod markdown;
mod types;

#[cfg(test)]
pub(crate) use extract::tests as fixtures;

pub use color::{color_emoji, DEFAULT_COLOR, DEFAULT_EMOJI};
pub use extract::{
    best_submission_url, build_description, extract_from_attachment, extract_from_item, is_pdf_url,
};
pub use markdown::{format_markdown, FormatOptions};
pub use types::{FormattedAnnotation, ItemAnnotationData};
