use tracing::{info, warn};

use crate::builder::{PayloadBuilder, RowOutcome};
use crate::dispatch::{BatchDispatcher, BulkSink, DispatchStats};
use crate::ebay::images::ImageResolver;
use crate::sheet::ListingRow;

/// What one pass over the sheet did. Failed rows and failed batches are
/// counted, not fatal; the log is the reconciliation record.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub rows: usize,
    pub built: usize,
    pub skipped: usize,
    pub failed: usize,
    pub dispatch: DispatchStats,
}

/// Drives one pass: build each row, accumulate, flush and pause on the row
/// cadence, then a final flush. Reruns reprocess every row; inventory items
/// are keyed by SKU on the platform side, offers are not.
pub struct Pipeline<R, S> {
    builder: PayloadBuilder<R>,
    dispatcher: BatchDispatcher<S>,
}

impl<R: ImageResolver, S: BulkSink> Pipeline<R, S> {
    pub fn new(builder: PayloadBuilder<R>, dispatcher: BatchDispatcher<S>) -> Self {
        Self {
            builder,
            dispatcher,
        }
    }

    pub async fn run(mut self, rows: &[ListingRow]) -> RunSummary {
        let mut summary = RunSummary {
            rows: rows.len(),
            ..RunSummary::default()
        };

        for (index, row) in rows.iter().enumerate() {
            match self.builder.build(row).await {
                Ok(RowOutcome::Built(payloads)) => {
                    self.dispatcher.add(payloads);
                    summary.built += 1;
                }
                Ok(RowOutcome::Skipped { reason }) => {
                    info!(
                        target = "lister.pipeline",
                        row = index + 1,
                        reason,
                        "row skipped"
                    );
                    summary.skipped += 1;
                }
                Err(err) => {
                    warn!(
                        target = "lister.pipeline",
                        row = index + 1,
                        error = %err,
                        "row failed"
                    );
                    summary.failed += 1;
                }
            }
            self.dispatcher.maybe_flush(index).await;
            self.dispatcher.maybe_pause(index).await;
        }

        self.dispatcher.final_flush().await;
        summary.dispatch = self.dispatcher.stats();
        summary
    }
}
