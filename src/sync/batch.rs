//! Batch orchestration
//!
//! Items are synced strictly one after another with a fixed pacing delay,
//! which keeps a full selection under the documented remote rate limit of
//! 10 requests per 60 seconds. One item failing never aborts the batch.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::library::Item;

use super::service::SyncService;
use super::types::{ProgressCallback, SyncOptions, SyncProgress, SyncResult};

/// Delay between consecutive submissions
pub const PACING_DELAY: Duration = Duration::from_secs(1);

/// Options for a batch run
#[derive(Default)]
pub struct BatchOptions {
    pub force: bool,
    /// Reported before each attempt with 1-based position and total
    pub on_progress: Option<ProgressCallback>,
    /// Checked between iterations; cancelling returns the partial results
    pub cancel: CancellationToken,
}

impl SyncService<'_> {
    /// Sync items in the given order, collecting one result per item
    pub async fn sync_many(&self, items: &[Item], mut options: BatchOptions) -> Vec<SyncResult> {
        let total = items.len();
        let mut results = Vec::with_capacity(total);

        for (index, item) in items.iter().enumerate() {
            if options.cancel.is_cancelled() {
                info!("Batch cancelled after {} of {} items", index, total);
                break;
            }

            if let Some(on_progress) = options.on_progress.as_mut() {
                on_progress(SyncProgress {
                    current: index + 1,
                    total,
                    current_item: Some(item.title.clone()),
                });
            }

            let result = self
                .sync_item(
                    item,
                    SyncOptions {
                        force: options.force,
                        ..Default::default()
                    },
                )
                .await;
            debug!(
                "Batch item {}/{} {}: {}",
                index + 1,
                total,
                item.key,
                if result.success { "ok" } else { "failed" }
            );
            results.push(result);

            if index + 1 < total {
                tokio::time::sleep(PACING_DELAY).await;
            }
        }

        results
    }
}
