//! Change-driven auto-sync
//!
//! Polls the library for recently modified items and coalesces the changed
//! keys for one full poll interval before syncing, so a burst of edits to
//! the same item produces a single submission. Unprocessed items sync when
//! `auto_sync` is enabled; already processed items re-sync (forced) when
//! `sync_on_item_change` is enabled.

use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::library::ZoteroLibrary;

use super::batch::PACING_DELAY;
use super::service::SyncService;
use super::store::ProcessedStore;
use super::types::SyncOptions;

/// Coalescing queue of changed item keys
///
/// Keys accumulate from the first push until the quiet window elapses, then
/// drain as one batch. Order is first-seen; duplicate pushes are ignored.
pub struct ChangeQueue {
    window: Duration,
    pending: Vec<String>,
    deadline: Option<Instant>,
}

impl ChangeQueue {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Vec::new(),
            deadline: None,
        }
    }

    pub fn push(&mut self, key: &str, now: Instant) {
        if !self.pending.iter().any(|k| k == key) {
            self.pending.push(key.to_string());
        }
        if self.deadline.is_none() {
            self.deadline = Some(now + self.window);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn ready(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn drain(&mut self) -> Vec<String> {
        self.deadline = None;
        std::mem::take(&mut self.pending)
    }
}

/// Auto-sync loop over a library
pub struct Watcher<'a> {
    library: &'a ZoteroLibrary,
    service: &'a SyncService<'a>,
}

impl<'a> Watcher<'a> {
    pub fn new(library: &'a ZoteroLibrary, service: &'a SyncService<'a>) -> Self {
        Self { library, service }
    }

    /// Run until cancelled, polling every `poll_interval`
    pub async fn run(
        &self,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        let settings = self.service.settings().get();
        if !settings.auto_sync && !settings.sync_on_item_change {
            warn!("Auto-sync is disabled; enable auto_sync or sync_on_item_change in settings");
            return Ok(());
        }

        info!("Watching library, polling every {:?}", poll_interval);

        let mut queue = ChangeQueue::new(poll_interval);
        let mut last_poll = Utc::now();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(poll_interval) => {}
            }

            let cutoff = last_poll;
            last_poll = Utc::now();

            let settings = self.service.settings().get();
            let processed = ProcessedStore::new(self.service.settings());
            let now = Instant::now();

            for key in self.library.modified_since(cutoff).await? {
                if processed.is_processed(&key) {
                    if settings.sync_on_item_change {
                        queue.push(&key, now);
                    }
                } else if settings.auto_sync {
                    queue.push(&key, now);
                }
            }

            if !queue.ready(Instant::now()) {
                continue;
            }

            for key in queue.drain() {
                if cancel.is_cancelled() {
                    return Ok(());
                }

                let Some(item) = self.library.item(&key).await? else {
                    continue;
                };
                // Changed-but-processed items only reach the queue under
                // sync_on_item_change, which implies a forced update
                let force = processed.is_processed(&key);
                let result = self
                    .service
                    .sync_item(
                        &item,
                        SyncOptions {
                            force,
                            ..Default::default()
                        },
                    )
                    .await;

                match (result.success, &result.error) {
                    (true, _) => info!("Auto-synced {}", result.item_key),
                    (false, Some(error)) => {
                        warn!("Auto-sync of {} failed: {}", result.item_key, error)
                    }
                    (false, None) => {}
                }

                tokio::time::sleep(PACING_DELAY).await;
            }
        }
    }
}
