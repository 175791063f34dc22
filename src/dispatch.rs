use async_trait::async_trait;
use thiserror::Error;
use tokio::time::{Duration, sleep};
use tracing::{info, warn};

use crate::builder::RowPayloads;
use crate::ebay::inventory::InventoryItemPayload;
use crate::ebay::offers::OfferPayload;

/// Rows per bulk call; the bulk endpoints accept at most this many entries.
pub const BATCH_SIZE: usize = 20;

/// Self-imposed breather after this many rows, whether or not the platform
/// has complained.
pub const PAUSE_INTERVAL: usize = 145;

pub const PAUSE_SECS: u64 = 120;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct SubmitError(pub String);

/// Where flushed batches go. The production implementation is the Sell API
/// client; tests substitute a recorder.
#[async_trait]
pub trait BulkSink {
    async fn submit_inventory(&self, requests: &[InventoryItemPayload])
    -> Result<(), SubmitError>;
    async fn submit_offers(&self, requests: &[OfferPayload]) -> Result<(), SubmitError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DispatchStats {
    pub flushes: u32,
    pub failed_submissions: u32,
    pub pauses: u32,
}

/// Accumulates payloads and drains them on the row cadence. The two payload
/// kinds ride the same cadence but go out as separate submissions; one can
/// fail while the other lands. A failed batch is dropped, never requeued,
/// and later rows start a fresh one.
pub struct BatchDispatcher<S> {
    sink: S,
    inventory: Vec<InventoryItemPayload>,
    offers: Vec<OfferPayload>,
    pause: Duration,
    stats: DispatchStats,
}

impl<S: BulkSink> BatchDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self::with_pause(sink, Duration::from_secs(PAUSE_SECS))
    }

    pub fn with_pause(sink: S, pause: Duration) -> Self {
        Self {
            sink,
            inventory: Vec::new(),
            offers: Vec::new(),
            pause,
            stats: DispatchStats::default(),
        }
    }

    pub fn add(&mut self, payloads: RowPayloads) {
        self.inventory.push(payloads.inventory);
        self.offers.push(payloads.offer);
    }

    /// Flush on every 20th row, counted 1-based over all rows seen, not over
    /// payloads accumulated; skipped rows still advance the cadence.
    pub async fn maybe_flush(&mut self, row_index: usize) {
        if (row_index + 1) % BATCH_SIZE == 0 {
            self.flush().await;
        }
    }

    /// Pause on every 145th row, independent of whether a flush just ran.
    pub async fn maybe_pause(&mut self, row_index: usize) {
        if (row_index + 1) % PAUSE_INTERVAL == 0 {
            info!(
                target = "lister.dispatch",
                processed = row_index + 1,
                pause_secs = self.pause.as_secs(),
                "rate-limit pause"
            );
            sleep(self.pause).await;
            self.stats.pauses += 1;
        }
    }

    /// Submit whatever is left after the row loop, whatever the batch size.
    pub async fn final_flush(&mut self) {
        self.flush().await;
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    async fn flush(&mut self) {
        if !self.inventory.is_empty() {
            match self.sink.submit_inventory(&self.inventory).await {
                Ok(()) => {
                    info!(
                        target = "lister.dispatch",
                        items = self.inventory.len(),
                        "inventory batch submitted"
                    );
                    self.stats.flushes += 1;
                }
                Err(err) => {
                    warn!(
                        target = "lister.dispatch",
                        items = self.inventory.len(),
                        error = %err,
                        "inventory batch failed, dropping"
                    );
                    self.stats.failed_submissions += 1;
                }
            }
            self.inventory.clear();
        }
        if !self.offers.is_empty() {
            match self.sink.submit_offers(&self.offers).await {
                Ok(()) => {
                    info!(
                        target = "lister.dispatch",
                        items = self.offers.len(),
                        "offer batch submitted"
                    );
                    self.stats.flushes += 1;
                }
                Err(err) => {
                    warn!(
                        target = "lister.dispatch",
                        items = self.offers.len(),
                        error = %err,
                        "offer batch failed, dropping"
                    );
                    self.stats.failed_submissions += 1;
                }
            }
            self.offers.clear();
        }
    }
}
