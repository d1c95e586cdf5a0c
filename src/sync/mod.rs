//! Sync orchestration
//!
//! One sync attempt per item: dedup check, extract, format, submit, record.
//! Batches run strictly sequentially to respect the remote rate limit and
//! to keep processed-set updates race-free.

mod batch;
mod service;
mod store;
mod types;
mod watch;

pub use batch::{BatchOptions, PACING_DELAY};
pub use service::SyncService;
pub use store::ProcessedStore;
pub use types::{ProgressCallback, SyncOptions, SyncProgress, SyncResult, SyncStats};
pub use watch::{ChangeQueue, Watcher};
