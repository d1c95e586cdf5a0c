//! Read-only access to a Zotero library
//!
//! The library database is the data source for everything this tool does.
//! It is never written to: items, attachments and annotations are loaded
//! into the snapshot types in [`types`] and the pipeline works on those.

mod reader;
mod types;

#[cfg(test)]
pub(crate) use reader::tests as fixtures;

pub use reader::ZoteroLibrary;
pub use types::{AnnotationKind, Attachment, Creator, Item, LibraryKind, RawAnnotation};
