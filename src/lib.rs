//! marginalia: sync Zotero PDF annotations to Capacities
//!
//! Reads highlights, notes and figure annotations out of a Zotero library,
//! renders them as a markdown document and submits them to a Capacities
//! space as weblink objects, tracking processed items so repeated runs
//! never duplicate a submission.
//!
//! Module map:
//! - [`library`]: read-only snapshot loading from zotero.sqlite
//! - [`annotations`]: extraction, aggregation and markdown rendering
//! - [`capacities`]: the remote API client
//! - [`sync`]: per-item sync, batch orchestration, dedup tracking, watch loop
//! - [`config`]: persisted settings

pub mod annotations;
pub mod capacities;
pub mod config;
pub mod error;
pub mod library;
pub mod sync;

pub use error::{Error, Result};
