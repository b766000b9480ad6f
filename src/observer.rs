//! Batch lifecycle events.

use crate::ledger::ItemStatus;

/// Receives orchestration lifecycle events.
///
/// Callbacks run inline between state transitions, so implementations must be
/// cheap and infallible.
pub trait BatchObserver {
    /// An item is about to be processed (skipped items emit nothing).
    fn on_item_start(&self, filename: &str);
    /// An item reached a terminal status in this run.
    fn on_item_end(&self, filename: &str, status: ItemStatus);
    /// The batch is aborting; `filename` is the item that triggered it.
    fn on_batch_abort(&self, filename: &str, reason: &str);
}

/// Default observer: forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl BatchObserver for LogObserver {
    fn on_item_start(&self, filename: &str) {
        tracing::info!(item = %filename, "processing item");
    }

    fn on_item_end(&self, filename: &str, status: ItemStatus) {
        tracing::info!(item = %filename, status = %status, "item finished");
    }

    fn on_batch_abort(&self, filename: &str, reason: &str) {
        tracing::error!(item = %filename, reason = %reason, "batch aborting");
    }
}
